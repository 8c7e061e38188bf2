//! Remote monitor model, as understood by the Uptrace API.
//!
//! These types are shared by the HTTP client, the projections and the
//! in-memory transport. Field names follow the service's camelCase JSON.
//! Server-owned fields (`id`, `projectId`, `status`, `error`, timestamps)
//! are decoded but never written into a request body.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::validation(format!(
                        "unsupported {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Monitor kind. Immutable once the monitor exists.
    MonitorType { Metric => "metric", Error => "error" }
}

wire_enum! {
    MonitorStatus { Active => "active", Paused => "paused", Failed => "failed" }
}

wire_enum! {
    /// Where the trigger bounds come from.
    BoundsSource { Manual => "manual", Auto => "auto" }
}

wire_enum! {
    NullsMode { Allow => "allow", Forbid => "forbid", Convert => "convert" }
}

wire_enum! {
    /// Sensitivity of automatically bounded monitors.
    Tolerance { Low => "low", Medium => "medium", High => "high" }
}

// ─────────────────────────────────────────────────────────────────────────────
// Monitor
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    #[serde(default, skip_serializing, deserialize_with = "de::opt_id")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing, deserialize_with = "de::opt_uint")]
    pub project_id: Option<u64>,

    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub monitor_type: Option<MonitorType>,

    #[serde(default, deserialize_with = "de::null_as_default")]
    pub notify_everyone_by_email: bool,
    /// Teams to be notified by email. Overrides `notify_everyone_by_email`.
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub team_ids: BTreeSet<u64>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub channel_ids: BTreeSet<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<RepeatInterval>,

    #[serde(default)]
    pub params: MonitorParams,

    #[serde(default, skip_serializing)]
    pub status: Option<MonitorStatus>,
    #[serde(default, skip_serializing)]
    pub error: Option<String>,
    #[serde(default, skip_serializing, deserialize_with = "de::opt_millis")]
    pub created_at: Option<u64>,
    #[serde(default, skip_serializing, deserialize_with = "de::opt_millis")]
    pub updated_at: Option<u64>,
    #[serde(default, skip_serializing, deserialize_with = "de::opt_millis")]
    pub checked_at: Option<u64>,
}

impl Monitor {
    pub fn is_error_monitor(&self) -> bool {
        self.monitor_type == Some(MonitorType::Error)
    }

    pub fn repeat_strategy(&self) -> Option<&str> {
        self.repeat_interval.as_ref().map(|r| r.strategy.as_str())
    }
}

/// Notification repeat policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatInterval {
    pub strategy: String,
}

impl RepeatInterval {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

impl Metric {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// Query and trigger settings.
///
/// Everything except `query` and `metrics` only means something for
/// `metric` monitors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorParams {
    #[serde(default)]
    pub query: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub metrics: Vec<Metric>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds_source: Option<BoundsSource>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de::opt_uint")]
    pub grouping_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de::opt_uint")]
    pub check_num_point: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls_mode: Option<NullsMode>,
    /// Milliseconds; delays the check.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de::opt_uint")]
    pub time_offset: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_allowed_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_allowed_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_dev_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_dev_fraction: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_allowed_flapping_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_allowed_flapping_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Tolerance>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de::opt_uint")]
    pub training_period: Option<u64>,
}

impl MonitorParams {
    /// Drop every setting an error monitor does not accept.
    pub fn retain_error_fields(&mut self) {
        *self = MonitorParams {
            query: std::mem::take(&mut self.query),
            metrics: std::mem::take(&mut self.metrics),
            ..MonitorParams::default()
        };
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lenient decoding
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) mod de {
    use serde::de::{self, Deserializer, Error as _};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Int(u64),
        Float(f64),
        Str(String),
    }

    fn to_uint<E: de::Error>(raw: NumOrString) -> Result<u64, E> {
        match raw {
            NumOrString::Int(n) => Ok(n),
            NumOrString::Float(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
            NumOrString::Float(f) => Err(E::custom(format!("expected a whole non-negative number, got {}", f))),
            NumOrString::Str(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| E::custom(format!("expected a numeric identifier, got '{}'", s))),
        }
    }

    /// Identifiers arrive as numbers or as numeric strings.
    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Option::<NumOrString>::deserialize(d)?.map(to_uint).transpose()
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        opt_id(d)?.ok_or_else(|| D::Error::custom("monitor id is null"))
    }

    /// Timestamps in milliseconds. Fractions are truncated.
    pub fn opt_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Option::<NumOrString>::deserialize(d)? {
            None => Ok(None),
            Some(NumOrString::Float(f)) if f.is_finite() && f >= 0.0 => Ok(Some(f.trunc() as u64)),
            Some(NumOrString::Str(s)) => Err(D::Error::custom(format!("expected a timestamp, got '{}'", s))),
            Some(raw) => to_uint(raw).map(Some),
        }
    }

    /// Whole numbers, which the service sometimes writes as floats.
    pub fn opt_uint<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Option::<NumOrString>::deserialize(d)? {
            None => Ok(None),
            Some(NumOrString::Str(s)) => Err(D::Error::custom(format!("expected a number, got '{}'", s))),
            Some(raw) => to_uint(raw).map(Some),
        }
    }

    pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}
