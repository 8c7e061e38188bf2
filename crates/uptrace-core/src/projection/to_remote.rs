//! Plan → wire.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{MetricData, MonitorData};
use crate::types::{Metric, Monitor, RepeatInterval};
use crate::value::Value;

/// Write every non-Unknown plan field onto `base`.
///
/// `Known` overwrites, `Null` clears (optional fields become `None`, the rest
/// their zero value), `Unknown` keeps whatever `base` already holds. Computed
/// fields are never projected. The result of projecting an `error` monitor
/// carries only `query` and `metrics` in its params.
pub fn to_remote(plan: &MonitorData, mut base: Monitor) -> Result<Monitor> {
    assign(&plan.name, &mut base.name);
    assign_opt(&plan.monitor_type, &mut base.monitor_type);
    assign(&plan.notify_everyone_by_email, &mut base.notify_everyone_by_email);
    assign_ids("team_ids", &plan.team_ids, &mut base.team_ids)?;
    assign_ids("channel_ids", &plan.channel_ids, &mut base.channel_ids)?;
    assign_opt(
        &plan.repeat_interval.as_ref().map(|s| RepeatInterval::new(s.as_str())),
        &mut base.repeat_interval,
    );

    let params = &mut base.params;
    assign(&plan.query, &mut params.query);
    match &plan.metrics {
        Value::Known(elements) => params.metrics = decode_metrics(elements)?,
        Value::Null => params.metrics.clear(),
        Value::Unknown => {}
    }

    assign_opt(&plan.column, &mut params.column);
    assign_opt(&plan.column_unit, &mut params.column_unit);
    assign_opt(&plan.bounds_source, &mut params.bounds_source);
    assign_uint("grouping_interval", &plan.grouping_interval, &mut params.grouping_interval)?;
    assign_uint("check_num_point", &plan.check_num_point, &mut params.check_num_point)?;
    assign_opt(&plan.nulls_mode, &mut params.nulls_mode);
    assign_uint("time_offset", &plan.time_offset, &mut params.time_offset)?;

    assign_opt(&plan.min_allowed_value, &mut params.min_allowed_value);
    assign_opt(&plan.max_allowed_value, &mut params.max_allowed_value);
    assign_opt(&plan.min_dev_value, &mut params.min_dev_value);
    assign_opt(&plan.min_dev_fraction, &mut params.min_dev_fraction);
    assign_opt(&plan.min_allowed_flapping_value, &mut params.min_allowed_flapping_value);
    assign_opt(&plan.max_allowed_flapping_value, &mut params.max_allowed_flapping_value);

    assign_opt(&plan.tolerance, &mut params.tolerance);
    assign_uint("training_period", &plan.training_period, &mut params.training_period)?;

    if base.is_error_monitor() {
        base.params.retain_error_fields();
    }

    Ok(base)
}

fn assign<T: Clone + Default>(value: &Value<T>, slot: &mut T) {
    match value {
        Value::Known(v) => *slot = v.clone(),
        Value::Null => *slot = T::default(),
        Value::Unknown => {}
    }
}

fn assign_opt<T: Clone>(value: &Value<T>, slot: &mut Option<T>) {
    match value {
        Value::Known(v) => *slot = Some(v.clone()),
        Value::Null => *slot = None,
        Value::Unknown => {}
    }
}

fn assign_uint(field: &str, value: &Value<i64>, slot: &mut Option<u64>) -> Result<()> {
    match value {
        Value::Known(v) => *slot = Some(to_uint(field, *v)?),
        Value::Null => *slot = None,
        Value::Unknown => {}
    }
    Ok(())
}

fn assign_ids(field: &str, value: &Value<BTreeSet<i64>>, slot: &mut BTreeSet<u64>) -> Result<()> {
    match value {
        Value::Known(ids) => {
            *slot = ids
                .iter()
                .map(|id| to_uint(field, *id))
                .collect::<Result<_>>()?;
        }
        Value::Null => slot.clear(),
        Value::Unknown => {}
    }
    Ok(())
}

fn to_uint(field: &str, v: i64) -> Result<u64> {
    u64::try_from(v).map_err(|_| Error::projection(format!("{} must not be negative, got {}", field, v)))
}

/// Decode metric elements in order. Missing `name`/`alias` become empty
/// strings, as the service accepts; an element that is itself unresolved
/// cannot be sent.
fn decode_metrics(elements: &[Value<MetricData>]) -> Result<Vec<Metric>> {
    elements
        .iter()
        .enumerate()
        .map(|(i, element)| match element {
            Value::Known(m) => Ok(Metric {
                name: m.name.known().cloned().unwrap_or_default(),
                alias: m.alias.known().cloned().unwrap_or_default(),
            }),
            Value::Null => Err(Error::projection(format!("metrics[{}] is null", i))),
            Value::Unknown => Err(Error::projection(format!("metrics[{}] is not known yet", i))),
        })
        .collect()
}
