//! Wire → state.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{MetricData, MonitorData};
use crate::types::Monitor;
use crate::value::Value;

/// Replace `target` with the declarative view of `remote`.
///
/// The model is rebuilt from scratch, never merged with what `target` held
/// before, so values the service dropped cannot survive. On error `target`
/// is left exactly as it was.
pub fn overlay(remote: &Monitor, target: &mut MonitorData) -> Result<()> {
    *target = project(remote)?;
    Ok(())
}

/// Build a complete declarative model from a remote monitor.
///
/// Every field becomes `Known`, except optional wire values that are absent,
/// which become `Null`. Collections are always `Known`, empty when the
/// service sent none.
pub fn project(remote: &Monitor) -> Result<MonitorData> {
    let id = remote
        .id
        .ok_or_else(|| Error::projection("monitor payload carries no id"))?;
    let params = &remote.params;

    Ok(MonitorData {
        id: Value::Known(id.to_string()),
        name: Value::Known(remote.name.clone()),
        monitor_type: Value::from_option(remote.monitor_type),
        query: Value::Known(params.query.clone()),
        metrics: Value::Known(
            params
                .metrics
                .iter()
                .map(|m| Value::Known(MetricData::new(m.name.as_str(), m.alias.as_str())))
                .collect(),
        ),

        notify_everyone_by_email: Value::Known(remote.notify_everyone_by_email),
        team_ids: Value::Known(to_int_set("team_ids", &remote.team_ids)?),
        channel_ids: Value::Known(to_int_set("channel_ids", &remote.channel_ids)?),
        repeat_interval: Value::from_option(remote.repeat_strategy().map(str::to_string)),
        column: Value::from_option(params.column.clone()),
        column_unit: Value::from_option(params.column_unit.clone()),
        bounds_source: Value::from_option(params.bounds_source),
        grouping_interval: opt_int("grouping_interval", params.grouping_interval)?,
        check_num_point: opt_int("check_num_point", params.check_num_point)?,
        nulls_mode: Value::from_option(params.nulls_mode),
        time_offset: opt_int("time_offset", params.time_offset)?,
        min_dev_value: Value::from_option(params.min_dev_value),
        min_dev_fraction: Value::from_option(params.min_dev_fraction),
        min_allowed_value: Value::from_option(params.min_allowed_value),
        max_allowed_value: Value::from_option(params.max_allowed_value),
        min_allowed_flapping_value: Value::from_option(params.min_allowed_flapping_value),
        max_allowed_flapping_value: Value::from_option(params.max_allowed_flapping_value),
        tolerance: Value::from_option(params.tolerance),
        training_period: opt_int("training_period", params.training_period)?,

        project_id: opt_int("project_id", remote.project_id)?,
        status: Value::from_option(remote.status),
        error: Value::Known(remote.error.clone().unwrap_or_default()),
        created_at: opt_int("created_at", remote.created_at)?,
        updated_at: opt_int("updated_at", remote.updated_at)?,
        checked_at: opt_int("checked_at", remote.checked_at)?,
    })
}

fn to_int(field: &str, v: u64) -> Result<i64> {
    i64::try_from(v).map_err(|_| Error::projection(format!("{} value {} is out of range", field, v)))
}

fn opt_int(field: &str, v: Option<u64>) -> Result<Value<i64>> {
    v.map(|v| to_int(field, v)).transpose().map(Value::from_option)
}

fn to_int_set(field: &str, ids: &BTreeSet<u64>) -> Result<BTreeSet<i64>> {
    ids.iter().map(|id| to_int(field, *id)).collect()
}
