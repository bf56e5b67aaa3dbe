//! Typed cell values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{Value, json};

use crate::schema::FieldType;

use super::parse::{FieldParseError, parse_present};
use super::time::{Color, ServiceTime};

/// Whether a cell holds a usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
    Present,
    Invalid,
    Absent,
}

/// A parsed cell.
///
/// `Absent` (empty cell) is distinct from `Invalid` (non-empty cell that
/// failed to parse) and from zero or an empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Absent,
    Invalid(String),
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Time(ServiceTime),
    Color(Color),
}

impl FieldValue {
    /// Parse a raw cell as `field_type`.
    ///
    /// Blank cells become `Absent`. Surrounding whitespace is ignored.
    pub fn parse(raw: &str, field_type: &FieldType) -> Result<FieldValue, FieldParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(FieldValue::Absent);
        }
        parse_present(trimmed, field_type)
    }

    pub fn state(&self) -> FieldState {
        match self {
            FieldValue::Absent => FieldState::Absent,
            FieldValue::Invalid(_) => FieldState::Invalid,
            _ => FieldState::Present,
        }
    }

    pub fn is_present(&self) -> bool {
        self.state() == FieldState::Present
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<ServiceTime> {
        match self {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Value used to order rows by a sequence key.
    pub fn sequence_value(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Time(t) => Some(t.seconds() as f64),
            FieldValue::Date(d) => Some(d.num_days_from_ce() as f64),
            _ => None,
        }
    }

    /// Compare two sequence values. Missing values sort last.
    pub fn cmp_sequence(&self, other: &FieldValue) -> Ordering {
        if let (FieldValue::Integer(a), FieldValue::Integer(b)) = (self, other) {
            return a.cmp(b);
        }
        match (self.sequence_value(), other.sequence_value()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Canonical text used in key indexes.
    ///
    /// `None` for invalid values; absent values key as the empty string.
    pub fn key_string(&self) -> Option<String> {
        match self {
            FieldValue::Absent => Some(String::new()),
            FieldValue::Invalid(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// JSON scalar for notice payloads.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Absent => Value::Null,
            FieldValue::Invalid(raw) | FieldValue::Text(raw) => json!(raw),
            FieldValue::Integer(v) => json!(v),
            FieldValue::Float(v) => json!(v),
            other => json!(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Invalid(raw) | FieldValue::Text(raw) => f.write_str(raw),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            FieldValue::Time(t) => write!(f, "{t}"),
            FieldValue::Color(c) => write!(f, "{c}"),
        }
    }
}
