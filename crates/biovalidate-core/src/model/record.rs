// biovalidate-core/src/model/record.rs
// ============================================================================
// Module: Tabular Data Model
// Description: Row-major table of dynamically-typed records.
// Purpose: Provide the canonical carrier for datasets flowing through the pipeline.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Table`] is the canonical representation of a validated dataset: a list of
//! column names plus a row-major list of [`Record`]s. Values are dynamically typed
//! (string, number, boolean, or null) because the source formats (guide RNA
//! libraries, variant annotation sheets, sample metadata sheets) do not share a
//! single schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Value
// ============================================================================

/// A single cell value in a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null / missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value (integer or floating point).
    Number(f64),
    /// String value.
    String(String),
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the value as a number, if it is numeric.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a canonical string form for equality/grouping purposes.
    ///
    /// Null values stringify to the empty string so that duplicate-detection
    /// and bias checks can treat "missing" as its own comparable bucket.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => format!("{value}"),
            Self::String(value) => value.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    #[allow(
        clippy::cast_precision_loss,
        reason = "record values are display-oriented; losslessness up to 2^53 is sufficient"
    )]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// An unordered mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a field, returning the previous value if present.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns the value for a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns true if the field is absent or explicitly null.
    #[must_use]
    pub fn is_missing(&self, field: &str) -> bool {
        self.0.get(field).is_none_or(Value::is_null)
    }

    /// Returns an iterator over `(field, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// SECTION: Table
// ============================================================================

/// A row-major table of records with a fixed, ordered column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Ordered, declared column names. Part of the table's identity.
    pub columns: Vec<String>,
    /// Row-major records. Row index (position in this vector) is the
    /// stable identifier used throughout `affected_rows`.
    pub rows: Vec<Record>,
}

impl Table {
    /// Creates a new table with the given declared columns and no rows.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the number of rows in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if the named column is declared on this table.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|candidate| candidate == column)
    }

    /// Extracts a column as a vector of optional values (by row order).
    ///
    /// A row missing the field, or holding an explicit null, yields `None`
    /// at that position so callers can distinguish "missing" from "present".
    #[must_use]
    pub fn column_values(&self, column: &str) -> Vec<Option<&Value>> {
        self.rows
            .iter()
            .map(|row| row.get(column).filter(|value| !value.is_null()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_canonical_string_treats_null_as_empty() {
        assert_eq!(Value::Null.canonical_string(), "");
    }

    #[test]
    fn record_is_missing_treats_explicit_null_as_missing() {
        let mut record = Record::new();
        record.insert("organism", Value::Null);
        assert!(record.is_missing("organism"));
        assert!(record.is_missing("nonexistent"));
    }

    #[test]
    fn table_column_values_preserves_row_order() {
        let mut table = Table::new(vec!["guide_id".to_string()]);
        for id in ["g1", "g2", "g3"] {
            let mut row = Record::new();
            row.insert("guide_id", id);
            table.rows.push(row);
        }
        let values: Vec<_> =
            table.column_values("guide_id").into_iter().map(|v| v.and_then(Value::as_str)).collect();
        assert_eq!(values, vec![Some("g1"), Some("g2"), Some("g3")]);
    }
}
