//! Population pyramid records.
//!
//! The mirrored field (by convention `MALE`) is drawn left of zero, so its
//! display series holds the negated value. Tooltips must still report the
//! magnitude.

use emigrant_stats_category_models::PyramidConfig;
use emigrant_stats_transform_models::{PeriodAggregate, PyramidRecord};

/// Builds one pyramid record per period.
#[must_use]
pub fn population_pyramid(
    periods: &[PeriodAggregate],
    config: &PyramidConfig,
) -> Vec<PyramidRecord> {
    periods
        .iter()
        .map(|period| {
            let mirrored = period.get(&config.mirrored);
            PyramidRecord {
                period: period.label.clone(),
                mirrored_field: config.mirrored.clone(),
                other_field: config.other.clone(),
                mirrored,
                other: period.get(&config.other),
                mirrored_negative: mirrored.saturating_neg(),
            }
        })
        .collect()
}

/// Value a tooltip shows for `series_key` of `record`.
///
/// The negated display series reports its absolute value. Returns `None`
/// for keys the record does not carry.
#[must_use]
pub fn tooltip_value(record: &PyramidRecord, series_key: &str) -> Option<i64> {
    if series_key == record.negative_key() {
        Some(record.mirrored_negative.saturating_abs())
    } else if series_key == record.mirrored_field {
        Some(record.mirrored)
    } else if series_key == record.other_field {
        Some(record.other)
    } else {
        None
    }
}
