//! Cell values and their classification for sinks.
//!
//! Rows carry [`Value`]s: whatever the row source produced, untouched. Before a
//! value reaches a sink, the writer classifies it into a [`CellValue`]:
//!
//! - **Numeric**: plain numbers
//! - **Percentage**: numbers whose textual form contains `%`, normalized to a
//!   `0..1` fraction so every sink applies the same percent convention
//! - **Date**: dates and date-times
//! - **Text**: everything else, after the shared control-character escaping
//!
//! Sinks never re-derive the classification from text.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::escape::normalize_cell_text;

/// A number together with the text it was rendered from, if any.
///
/// The text matters: `"45%"` and `45` have the same magnitude but the former
/// is exported as the fraction `0.45`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Number {
    pub magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Number {
    pub fn new(magnitude: f64) -> Self {
        Self {
            magnitude,
            text: None,
        }
    }

    /// A number rendered with a percent marker, e.g. `Number::percent(45.0)`
    /// displays as `45%`.
    pub fn percent(magnitude: f64) -> Self {
        Self {
            magnitude,
            text: Some(format!("{}%", format_number(magnitude))),
        }
    }

    pub fn is_percentage(&self) -> bool {
        self.text.as_deref().is_some_and(|t| t.contains('%'))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(text),
            None => f.write_str(&format_number(self.magnitude)),
        }
    }
}

/// A raw value held by a cell or produced by a row source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        Value::Number(Number::new(n))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a JSON value as found in table documents.
    ///
    /// Strings that look like percentages (`"12.5%"`) become numbers carrying
    /// their text; ISO dates (`2024-03-01`, `2024-03-01T10:00:00`) become
    /// dates. Arrays and objects are kept as their JSON text.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => parse_text(s),
            other => Value::Text(other.to_string()),
        }
    }

    /// Ordering used when a column declares no comparator.
    ///
    /// Nulls sort first, then booleans, numbers, dates and text. Within a kind
    /// the natural order applies; dates and date-times compare on a common
    /// timeline.
    pub fn natural_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.magnitude.total_cmp(&b.magnitude),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) if a.kind_rank() == 3 && b.kind_rank() == 3 => {
                a.as_datetime().cmp(&b.as_datetime())
            }
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Date(_) | Value::DateTime(_) => 3,
            Value::Text(_) => 4,
        }
    }

    fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => f.write_str(&format_datetime(dt)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

fn parse_text(s: &str) -> Value {
    let trimmed = s.trim();
    if let Some(number) = trimmed.strip_suffix('%') {
        if let Ok(magnitude) = number.trim().parse::<f64>() {
            return Value::Number(Number {
                magnitude,
                text: Some(trimmed.to_string()),
            });
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Value::Date(date);
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Value::DateTime(dt);
        }
    }
    Value::Text(s.to_string())
}

/// A value as handed to a sink: classified, normalized and escaped.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Numeric(f64),
    /// Fraction in `0..1` space: `45%` arrives as `0.45`.
    Percentage(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Text rendering shared by the text-oriented sinks.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Numeric(n) => format_number(*n),
            CellValue::Percentage(fraction) => {
                let percent = (fraction * 100.0 * 100.0).round() / 100.0;
                format!("{}%", format_number(percent))
            }
            CellValue::Date(dt) => format_datetime(dt),
            CellValue::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Classify a raw value for the sinks.
pub fn classify(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Number(n) if n.is_percentage() => CellValue::Percentage(n.magnitude / 100.0),
        Value::Number(n) => CellValue::Numeric(n.magnitude),
        Value::Date(d) => CellValue::Date(d.and_time(NaiveTime::MIN)),
        Value::DateTime(dt) => CellValue::Date(*dt),
        Value::Bool(b) => CellValue::Text(b.to_string()),
        Value::Text(s) => CellValue::Text(normalize_cell_text(s)),
    }
}

/// Render a float without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
