//! Pre-flight checks. Nothing here touches the network.

use crate::error::{Error, Result};
use crate::model::MonitorData;
use crate::types::{Monitor, MonitorType};
use crate::value::Value;

/// Which lifecycle step a plan is validated for.
#[derive(Debug, Clone, Copy)]
pub enum ValidationMode<'a> {
    Create,
    Update { state: &'a MonitorData },
}

/// Check a plan before it is projected.
pub fn validate_plan(plan: &MonitorData, mode: ValidationMode<'_>) -> Result<()> {
    let mut problems = Vec::new();

    match mode {
        ValidationMode::Create => {
            for (field, value) in [("name", plan.name.is_known()), ("query", plan.query.is_known())] {
                if !value {
                    problems.push(format!("{} is required", field));
                }
            }
            if !plan.monitor_type.is_known() {
                problems.push("type is required".to_string());
            }
            if plan.id.is_known() {
                problems.push("id is assigned by Uptrace and cannot be planned".to_string());
            }
            let computed = plan.computed_fields_set();
            if !computed.is_empty() {
                problems.push(format!(
                    "computed fields cannot be set: {}",
                    computed.join(", ")
                ));
            }
        }
        ValidationMode::Update { state } => {
            if state.remote_id().is_none() {
                problems.push("state has no id; create the monitor first".to_string());
            }
            if let (Value::Known(planned), Value::Known(current)) = (&plan.id, &state.id) {
                if planned != current {
                    problems.push(format!("id cannot change (state {}, plan {})", current, planned));
                }
            }
            if let (Value::Known(planned), Value::Known(current)) =
                (&plan.monitor_type, &state.monitor_type)
            {
                if planned != current {
                    problems.push(format!(
                        "type cannot change after creation ({} -> {})",
                        current, planned
                    ));
                }
            }
            for (field, null) in [("name", plan.name.is_null()), ("query", plan.query.is_null())] {
                if null {
                    problems.push(format!("{} cannot be null", field));
                }
            }
        }
    }

    if plan.id.is_null() {
        problems.push("id cannot be null".to_string());
    }
    if plan.monitor_type.is_null() {
        problems.push("type cannot be null".to_string());
    }

    match plan.monitor_type.known() {
        Some(MonitorType::Metric) => {
            if plan.metrics.is_null() {
                problems.push("metrics are required for metric monitors".to_string());
            }
            match (&plan.min_allowed_value, &plan.max_allowed_value) {
                (Value::Null, Value::Null) => problems.push(
                    "one of min_allowed_value or max_allowed_value is required".to_string(),
                ),
                (Value::Known(_), Value::Known(_)) => problems.push(
                    "only one of min_allowed_value or max_allowed_value can be set".to_string(),
                ),
                _ => {}
            }
        }
        Some(MonitorType::Error) => {
            let extra = plan.metric_only_fields_set();
            if !extra.is_empty() {
                problems.push(format!(
                    "error monitors do not accept: {}",
                    extra.join(", ")
                ));
            }
        }
        None => {}
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(problems.join("; ")))
    }
}

/// Check a projected payload right before it is sent.
///
/// Catches threshold conflicts that only appear once Unknown plan fields have
/// been resolved against defaults or the current monitor.
pub fn validate_payload(monitor: &Monitor) -> Result<()> {
    match monitor.monitor_type {
        None => Err(Error::validation("payload has no monitor type")),
        Some(MonitorType::Error) => Ok(()),
        Some(MonitorType::Metric) => {
            let p = &monitor.params;
            match (p.min_allowed_value, p.max_allowed_value) {
                (Some(_), None) | (None, Some(_)) => Ok(()),
                (None, None) => Err(Error::validation(
                    "one of min_allowed_value or max_allowed_value is required",
                )),
                (Some(min), Some(max)) => Err(Error::validation(format!(
                    "min_allowed_value ({}) and max_allowed_value ({}) are both set; set the other one to null",
                    min, max
                ))),
            }
        }
    }
}
