//! Core type definitions for schema representation.

use serde::{Deserialize, Serialize};

/// Declared data type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum FieldType {
    /// Free text.
    Text,
    /// Identifier, compared verbatim.
    Id,
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Service date in `YYYYMMDD` form.
    Date,
    /// Service time in `H:MM:SS` form; hours may exceed 23.
    Time,
    /// Six hexadecimal digits, no leading `#`.
    Color,
    /// ISO 4217 currency code.
    Currency,
    /// E-mail address.
    Email,
    /// Fully qualified http(s) URL.
    Url,
    /// IETF BCP 47 language tag.
    LanguageCode,
    /// TZ database zone name.
    Timezone,
    /// Integer restricted to an allowed set.
    Enum(Vec<i64>),
}

/// Role a field plays in keys and ordering.
///
/// A field without roles is a plain data column. A field may carry several
/// roles at once, e.g. `stop_times.trip_id` is part of the primary key, the
/// grouping key and a foreign key into `trips`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum KeyRole {
    /// Part of the table's primary key, in declaration order.
    PrimaryKeyPart,
    /// References the primary key of another table.
    ForeignKey { table: String, field: String },
    /// Clusters rows into groups.
    GroupingKey,
    /// Orders rows within a group.
    SequenceKey,
}

/// Inclusive numeric bounds checked when values are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn non_negative() -> Self {
        Self {
            min: Some(0.0),
            max: None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let below_min = self.min.map(|m| value < m).unwrap_or(false);
        let above_max = self.max.map(|m| value > m).unwrap_or(false);
        !(below_min || above_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = NumericRange::new(-90.0, 90.0);
        assert!(range.contains(-90.0));
        assert!(range.contains(90.0));
        assert!(!range.contains(90.000001));
        assert!(NumericRange::non_negative().contains(1e9));
        assert!(!NumericRange::non_negative().contains(-0.5));
    }
}
