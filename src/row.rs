//! Typed access over raw spatial query rows.
//!
//! Designation tables share no common shape, so rows arrive as a plain
//! column -> JSON value map. Every accessor here returns `Option` and never
//! fails: a missing column, a null, or a value of an unexpected type all read
//! as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One row returned by a spatial lookup, geometry columns already removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self(columns)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Trimmed, non-empty text rendering of a column.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(clean_text)
    }

    /// Column parsed as a calendar date, formatted `YYYY-MM-DD`.
    pub fn date(&self, field: &str) -> Option<String> {
        self.get(field).and_then(parse_date)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// First non-empty value among `fields`, or a fresh UUID when every
    /// candidate is absent.
    pub fn identifier(&self, fields: &[&str]) -> String {
        fields
            .iter()
            .find_map(|field| self.text(field))
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(columns: Map<String, Value>) -> Self {
        Self(columns)
    }
}

impl From<Value> for RawRow {
    /// Non-object values become an empty row.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(columns) => Self(columns),
            _ => Self::default(),
        }
    }
}

/// Render a scalar JSON value as trimmed text. Null, blank strings and
/// nested values are absent.
pub fn clean_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a JSON value into a `YYYY-MM-DD` date string.
///
/// Accepts plain dates, RFC 3339 timestamps (converted to UTC) and naive
/// timestamps with either a `T` or a space separator. Anything else is
/// absent.
pub fn parse_date(value: &Value) -> Option<String> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc().date().format("%Y-%m-%d").to_string());
    }
    // Postgres text form of timestamptz: "2020-01-01 00:00:00+00"
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.naive_utc().date().format("%Y-%m-%d").to_string());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date().format("%Y-%m-%d").to_string())
}
