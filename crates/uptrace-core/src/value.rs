//! Three-state presence marker for declarative fields.
//!
//! A plan field is either resolved to a value, explicitly cleared, or not yet
//! known (it will be decided by a default or by the server). `Null` and
//! `Unknown` must never be conflated: projecting `Null` clears the remote
//! field, projecting `Unknown` leaves it alone.
//!
//! Serde mapping:
//!
//! | plan file     | `Value`      |
//! |---------------|--------------|
//! | key absent    | `Unknown`    |
//! | `null`        | `Null`       |
//! | any value     | `Known(v)`   |
//!
//! Fields must carry `#[serde(default, skip_serializing_if = "Value::is_unknown")]`
//! for the absent-key row to hold.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Value<T> {
    Known(T),
    Null,
    #[default]
    Unknown,
}

impl<T> Value<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// The value, if known.
    pub fn known(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_known(self) -> Option<T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Value::Known(v) => Value::Known(v),
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Known(v) => Value::Known(f(v)),
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
        }
    }

    /// `None` becomes `Null`; this is how optional wire values overlay.
    pub fn from_option(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Value::Known(v),
            None => Value::Null,
        }
    }
}

impl<T> From<T> for Value<T> {
    fn from(v: T) -> Self {
        Value::Known(v)
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Known(v) => v.serialize(serializer),
            // Unknown is skipped by the field attribute; if it still reaches
            // here it is written as null.
            Value::Null | Value::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Value::from_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thresholds {
        #[serde(default, skip_serializing_if = "Value::is_unknown")]
        threshold: Value<f64>,
    }

    #[test]
    fn test_absent_key_is_unknown() {
        let p: Thresholds = serde_json::from_str("{}").unwrap();
        assert_eq!(p.threshold, Value::Unknown);
    }

    #[test]
    fn test_null_is_null() {
        let p: Thresholds = serde_json::from_str(r#"{"threshold": null}"#).unwrap();
        assert_eq!(p.threshold, Value::Null);
    }

    #[test]
    fn test_value_is_known() {
        let p: Thresholds = serde_json::from_str(r#"{"threshold": 0.0}"#).unwrap();
        assert_eq!(p.threshold, Value::Known(0.0));
    }

    #[test]
    fn test_serialize_skips_unknown_and_keeps_null() {
        let unknown = Thresholds { threshold: Value::Unknown };
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "{}");

        let null = Thresholds { threshold: Value::Null };
        assert_eq!(serde_json::to_string(&null).unwrap(), r#"{"threshold":null}"#);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from_option(Some(3)), Value::Known(3));
        assert_eq!(Value::<i32>::from_option(None), Value::Null);
    }
}
