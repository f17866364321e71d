//! Field lists and per-field derivation rules
//!
//! Stateless helpers that turn raw JSON values into [`FieldValue`] cells.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use super::FieldValue;
use crate::ActivityRecord;

/// Column order of the compact fieldset
pub const COMPACT_FIELDS: [&str; 14] = [
    "id",
    "name",
    "distance",
    "moving_time",
    "elapsed_time",
    "total_elevation_gain",
    "start_date",
    "average_speed",
    "max_speed",
    "average_temp",
    "elev_high",
    "elev_low",
    "calories",
    "pr_count",
];

/// Column order of the extended fieldset
pub const EXTENDED_FIELDS: [&str; 21] = [
    "id",
    "name",
    "type",
    "date",
    "start_time",
    "distance_m",
    "distance_km",
    "moving_time_s",
    "moving_time_min",
    "elapsed_time_s",
    "elevation_gain_m",
    "average_speed_ms",
    "max_speed_ms",
    "average_hr",
    "max_hr",
    "calories",
    "location",
    "kudos",
    "commute",
    "trainer",
    "manual",
];

const METERS_PER_KM: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;
const MS_TO_KMH: f64 = 3.6;

/// Round half to even at 2 decimal places on the exact binary value
///
/// The result is the float nearest to the rounded decimal, so `10.23` comes
/// back as the literal `10.23`. Values outside the `Decimal` range are
/// returned unchanged.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .map(|d| d.mantissa() as f64 / 10f64.powi(d.scale() as i32))
        .unwrap_or(value)
}

/// Copy a raw value as-is, or null when absent
pub fn passthrough(record: &ActivityRecord, key: &str) -> FieldValue {
    record.get(key).map(FieldValue::from).unwrap_or(FieldValue::Null)
}

/// Copy a raw value, or empty text when absent
pub fn text_or_empty(record: &ActivityRecord, key: &str) -> FieldValue {
    match record.get(key) {
        Some(value) => FieldValue::from(value),
        None => FieldValue::Text(String::new()),
    }
}

/// Raw value divided by `divisor`, rounded; absent or non-numeric counts as zero
pub fn scaled_or_zero(record: &ActivityRecord, key: &str, divisor: f64) -> FieldValue {
    let raw = record.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    FieldValue::Float(round2(raw / divisor))
}

/// Meters to kilometers
pub fn kilometers(record: &ActivityRecord, key: &str) -> FieldValue {
    scaled_or_zero(record, key, METERS_PER_KM)
}

/// Seconds to minutes
pub fn minutes(record: &ActivityRecord, key: &str) -> FieldValue {
    scaled_or_zero(record, key, SECONDS_PER_MINUTE)
}

/// m/s to km/h
///
/// Absent becomes integer 0. Null and zero stay as they are, and so does
/// anything that is not a number.
pub fn kmh(record: &ActivityRecord, key: &str) -> FieldValue {
    match record.get(key) {
        None => FieldValue::Int(0),
        Some(value) => match value.as_f64() {
            Some(speed) if speed != 0.0 => FieldValue::Float(round2(speed * MS_TO_KMH)),
            _ => FieldValue::from(value),
        },
    }
}

/// First 10 characters of a timestamp string (`YYYY-MM-DD`)
pub fn date_prefix(record: &ActivityRecord, key: &str) -> FieldValue {
    let date = record
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.chars().take(10).collect())
        .unwrap_or_default();
    FieldValue::Text(date)
}
