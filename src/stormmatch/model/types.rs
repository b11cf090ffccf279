//! Core record data types.
//!
//! This module contains the value type used throughout the correlation
//! engine: [`FieldValue`], a nullable tagged value for record fields.

use chrono::NaiveDateTime;
use std::fmt;

/// Display format for canonical timestamps in output tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value in a record field.
///
/// `Null` is the canonical representation of "absent": unparseable cells,
/// missing columns, and empty counterpart sides of residual rows all
/// degrade to `Null` rather than raising.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value (true/false)
    Boolean(bool),
    /// Canonical instant, second resolution, UTC
    Timestamp(NaiveDateTime),
    /// Absent value
    Null,
}

impl FieldValue {
    /// Infer a typed value from a raw CSV cell.
    ///
    /// Empty cells become `Null`; integer and float literals are detected
    /// before falling back to `String`. Parsing never fails.
    pub fn from_csv_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return FieldValue::Float(f);
        }
        match trimmed {
            "true" | "TRUE" | "True" => FieldValue::Boolean(true),
            "false" | "FALSE" | "False" => FieldValue::Boolean(false),
            _ => FieldValue::String(trimmed.to_string()),
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns true for the absent value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "Integer",
            FieldValue::Float(_) => "Float",
            FieldValue::String(_) => "String",
            FieldValue::Boolean(_) => "Boolean",
            FieldValue::Timestamp(_) => "Timestamp",
            FieldValue::Null => "Null",
        }
    }
}

/// Display renders values the way they serialize into output CSV:
/// `Null` as the empty string, timestamps in [`TIMESTAMP_FORMAT`].
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            FieldValue::Null => Ok(()),
        }
    }
}
