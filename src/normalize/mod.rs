//! Record normalization
//!
//! Maps raw [`ActivityRecord`]s into flat [`NormalizedRow`]s. Every row a
//! given [`Normalizer`] produces has the same columns in the same order;
//! missing source fields become null or a default, never a dropped column.
//!
//! Normalization is pure and infallible.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::ActivityRecord;

pub mod fields;

/// Named set and order of output columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fieldset {
    /// 14 columns with km, minutes and km/h conversions
    Compact,
    /// 21 columns with raw and converted values side by side
    #[default]
    Extended,
}

impl Fieldset {
    /// Column names in output order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Fieldset::Compact => &fields::COMPACT_FIELDS,
            Fieldset::Extended => &fields::EXTENDED_FIELDS,
        }
    }
}

impl FromStr for Fieldset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Fieldset::Compact),
            "extended" => Ok(Fieldset::Extended),
            _ => Err(format!(
                "Invalid fieldset: {}. Valid values: compact, extended",
                s
            )),
        }
    }
}

impl fmt::Display for Fieldset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Fieldset::Compact => "compact",
            Fieldset::Extended => "extended",
        };
        write!(f, "{}", s)
    }
}

/// One scalar cell of a normalized row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Missing or explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
}

impl FieldValue {
    /// Render for a CSV cell
    ///
    /// Null is empty and booleans are `True`/`False`. Floats use the shortest
    /// round-trip form with a fractional part (`18.0`), switching to a signed,
    /// two-digit exponent outside `1e-4..1e16` (`1e+16`, `1e-05`).
    pub fn render(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(true) => "True".to_string(),
            FieldValue::Bool(false) => "False".to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(x) => render_float(*x),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// True for [`FieldValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

fn render_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Debug already picks the same notation thresholds; only the exponent differs
    let repr = format!("{:?}", x);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
            }
            Err(_) => repr,
        },
        None => repr,
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            // Nested values are kept as their JSON text
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A flat, ordered row of named cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    cells: Vec<(&'static str, FieldValue)>,
}

impl NormalizedRow {
    /// Column names in order
    pub fn headers(&self) -> Vec<&'static str> {
        self.cells.iter().map(|(name, _)| *name).collect()
    }

    /// Cell values in column order
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    /// Look up a cell by column name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.cells
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells rendered for CSV, in column order
    pub fn rendered(&self) -> Vec<String> {
        self.values().map(FieldValue::render).collect()
    }

    /// True if both rows have the same columns in the same order
    pub fn same_columns(&self, other: &NormalizedRow) -> bool {
        self.cells.len() == other.cells.len()
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|((a, _), (b, _))| a == b)
    }
}

/// Normalizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizerConfig {
    /// Output columns
    pub fieldset: Fieldset,
}

/// Maps raw activity records into normalized rows
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Normalizer for the given fieldset
    pub fn new(fieldset: Fieldset) -> Self {
        Self::with_config(NormalizerConfig { fieldset })
    }

    /// Normalizer from an explicit config
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Active fieldset
    pub fn fieldset(&self) -> Fieldset {
        self.config.fieldset
    }

    /// Normalize one record
    pub fn normalize(&self, record: &ActivityRecord) -> NormalizedRow {
        let cells = match self.config.fieldset {
            Fieldset::Compact => compact_cells(record),
            Fieldset::Extended => extended_cells(record),
        };
        debug_assert_eq!(
            cells.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            self.config.fieldset.columns()
        );
        NormalizedRow { cells }
    }

    /// Normalize a batch, preserving order
    pub fn normalize_all(&self, records: &[ActivityRecord]) -> Vec<NormalizedRow> {
        records.iter().map(|r| self.normalize(r)).collect()
    }
}

fn compact_cells(r: &ActivityRecord) -> Vec<(&'static str, FieldValue)> {
    use fields::*;
    vec![
        ("id", passthrough(r, "id")),
        ("name", passthrough(r, "name")),
        ("distance", kilometers(r, "distance")),
        ("moving_time", minutes(r, "moving_time")),
        ("elapsed_time", passthrough(r, "elapsed_time")),
        ("total_elevation_gain", passthrough(r, "total_elevation_gain")),
        ("start_date", text_or_empty(r, "start_date")),
        ("average_speed", kmh(r, "average_speed")),
        ("max_speed", kmh(r, "max_speed")),
        ("average_temp", passthrough(r, "average_temp")),
        ("elev_high", passthrough(r, "elev_high")),
        ("elev_low", passthrough(r, "elev_low")),
        ("calories", passthrough(r, "calories")),
        ("pr_count", passthrough(r, "pr_count")),
    ]
}

fn extended_cells(r: &ActivityRecord) -> Vec<(&'static str, FieldValue)> {
    use fields::*;
    vec![
        ("id", passthrough(r, "id")),
        ("name", passthrough(r, "name")),
        ("type", passthrough(r, "type")),
        ("date", date_prefix(r, "start_date")),
        ("start_time", text_or_empty(r, "start_date")),
        ("distance_m", passthrough(r, "distance")),
        ("distance_km", kilometers(r, "distance")),
        ("moving_time_s", passthrough(r, "moving_time")),
        ("moving_time_min", minutes(r, "moving_time")),
        ("elapsed_time_s", passthrough(r, "elapsed_time")),
        ("elevation_gain_m", passthrough(r, "total_elevation_gain")),
        ("average_speed_ms", passthrough(r, "average_speed")),
        ("max_speed_ms", passthrough(r, "max_speed")),
        ("average_hr", passthrough(r, "average_heartrate")),
        ("max_hr", passthrough(r, "max_heartrate")),
        ("calories", passthrough(r, "calories")),
        ("location", text_or_empty(r, "location_city")),
        ("kudos", passthrough(r, "kudos_count")),
        ("commute", passthrough(r, "commute")),
        ("trainer", passthrough(r, "trainer")),
        ("manual", passthrough(r, "manual")),
    ]
}
