//! Declarative monitor model.
//!
//! The same shape as [`crate::types::Monitor`], with every field wrapped in
//! [`Value`] so a plan can say "set", "clear" or "let the server decide".
//! A `MonitorData` read from a plan file is a *plan*; one produced by the
//! overlay projection is a *state*.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{BoundsSource, MonitorStatus, MonitorType, NullsMode, Tolerance};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitorData {
    // required
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub id: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub name: Value<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Value::is_unknown")]
    pub monitor_type: Value<MonitorType>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub query: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub metrics: Value<Vec<Value<MetricData>>>,

    // optional
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub notify_everyone_by_email: Value<bool>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub team_ids: Value<BTreeSet<i64>>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub channel_ids: Value<BTreeSet<i64>>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub repeat_interval: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub column: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub column_unit: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub bounds_source: Value<BoundsSource>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub grouping_interval: Value<i64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub check_num_point: Value<i64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub nulls_mode: Value<NullsMode>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub time_offset: Value<i64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub min_dev_value: Value<f64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub min_dev_fraction: Value<f64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub min_allowed_value: Value<f64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub max_allowed_value: Value<f64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub min_allowed_flapping_value: Value<f64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub max_allowed_flapping_value: Value<f64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub tolerance: Value<Tolerance>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub training_period: Value<i64>,

    // computed
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub project_id: Value<i64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub status: Value<MonitorStatus>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub error: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub created_at: Value<i64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub updated_at: Value<i64>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub checked_at: Value<i64>,
}

/// One `{name, alias}` entry of the metrics list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MetricData {
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub name: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub alias: Value<String>,
}

impl MetricData {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: Value::Known(name.into()),
            alias: Value::Known(alias.into()),
        }
    }
}

impl MonitorData {
    /// Known fields that only the server may set, by name.
    pub fn computed_fields_set(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.project_id.is_known() {
            set.push("project_id");
        }
        if self.status.is_known() {
            set.push("status");
        }
        if self.error.is_known() {
            set.push("error");
        }
        if self.created_at.is_known() {
            set.push("created_at");
        }
        if self.updated_at.is_known() {
            set.push("updated_at");
        }
        if self.checked_at.is_known() {
            set.push("checked_at");
        }
        set
    }

    /// Known metric-only params, by name. Error monitors accept none of them.
    pub fn metric_only_fields_set(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 15] = [
            ("column", self.column.is_known()),
            ("column_unit", self.column_unit.is_known()),
            ("bounds_source", self.bounds_source.is_known()),
            ("grouping_interval", self.grouping_interval.is_known()),
            ("check_num_point", self.check_num_point.is_known()),
            ("nulls_mode", self.nulls_mode.is_known()),
            ("time_offset", self.time_offset.is_known()),
            ("min_dev_value", self.min_dev_value.is_known()),
            ("min_dev_fraction", self.min_dev_fraction.is_known()),
            ("min_allowed_value", self.min_allowed_value.is_known()),
            ("max_allowed_value", self.max_allowed_value.is_known()),
            ("min_allowed_flapping_value", self.min_allowed_flapping_value.is_known()),
            ("max_allowed_flapping_value", self.max_allowed_flapping_value.is_known()),
            ("tolerance", self.tolerance.is_known()),
            ("training_period", self.training_period.is_known()),
        ];
        checks
            .into_iter()
            .filter_map(|(name, known)| known.then_some(name))
            .collect()
    }

    /// The remote id, when it has been assigned.
    pub fn remote_id(&self) -> Option<&str> {
        self.id.known().map(String::as_str)
    }
}
