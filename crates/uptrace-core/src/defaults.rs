//! Server-side defaults for new monitors.
//!
//! Defaults are a base layer: a value already present in the input is kept.
//! They are applied once, when a monitor is created. Updates start from the
//! monitor as the service currently has it.

use crate::types::{BoundsSource, Monitor, MonitorStatus, NullsMode, RepeatInterval, Tolerance};

pub const DEFAULT_STATUS: MonitorStatus = MonitorStatus::Active;
pub const DEFAULT_REPEAT_STRATEGY: &str = "default";
pub const DEFAULT_COLUMN_UNIT: &str = "1";
pub const DEFAULT_BOUNDS_SOURCE: BoundsSource = BoundsSource::Manual;
/// 1 minute
pub const DEFAULT_GROUPING_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_CHECK_NUM_POINT: u64 = 5;
pub const DEFAULT_NULLS_MODE: NullsMode = NullsMode::Allow;
pub const DEFAULT_MIN_DEV_FRACTION: f64 = 0.2;
pub const DEFAULT_MIN_ALLOWED_VALUE: f64 = 0.0;
pub const DEFAULT_TOLERANCE: Tolerance = Tolerance::Medium;
/// 24 hours
pub const DEFAULT_TRAINING_PERIOD_MS: u64 = 86_400_000;

/// Fill every absent field of `partial` with the service default.
pub fn with_defaults(mut partial: Monitor) -> Monitor {
    partial.status.get_or_insert(DEFAULT_STATUS);
    partial
        .repeat_interval
        .get_or_insert_with(|| RepeatInterval::new(DEFAULT_REPEAT_STRATEGY));

    let params = &mut partial.params;
    params
        .column_unit
        .get_or_insert_with(|| DEFAULT_COLUMN_UNIT.to_string());
    params.bounds_source.get_or_insert(DEFAULT_BOUNDS_SOURCE);
    params.grouping_interval.get_or_insert(DEFAULT_GROUPING_INTERVAL_MS);
    params.check_num_point.get_or_insert(DEFAULT_CHECK_NUM_POINT);
    params.nulls_mode.get_or_insert(DEFAULT_NULLS_MODE);
    params.min_dev_fraction.get_or_insert(DEFAULT_MIN_DEV_FRACTION);
    params.min_allowed_value.get_or_insert(DEFAULT_MIN_ALLOWED_VALUE);
    params.tolerance.get_or_insert(DEFAULT_TOLERANCE);
    params.training_period.get_or_insert(DEFAULT_TRAINING_PERIOD_MS);

    partial
}

impl Monitor {
    /// An empty monitor carrying every service default.
    pub fn with_defaults() -> Self {
        with_defaults(Monitor::default())
    }
}
