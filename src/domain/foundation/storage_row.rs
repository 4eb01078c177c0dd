//! Tabular storage row.
//!
//! The backing store is a sheet-like table: every row is a set of string
//! cells keyed by column header. Entities convert to and from this shape
//! through their `from_storage_row` / `to_storage_row` factories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::ValidationError;

/// One row of a table, keyed by column header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRow {
    cells: BTreeMap<String, String>,
}

impl StorageRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a cell value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a cell value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Sets a cell only when the value is present.
    pub fn set_opt(&mut self, column: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set(column, value);
        }
    }

    /// Returns the trimmed cell value, treating blank cells as missing.
    pub fn optional(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns the cell value or an `EmptyField` error.
    pub fn required(&self, column: &str) -> Result<&str, ValidationError> {
        self.optional(column)
            .ok_or_else(|| ValidationError::empty_field(column))
    }

    /// Parses a required cell.
    pub fn parse<T>(&self, column: &str) -> Result<T, ValidationError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(column)?;
        raw.parse::<T>()
            .map_err(|e| ValidationError::invalid_format(column, e.to_string()))
    }

    /// Parses an optional cell; blank cells yield `None`.
    pub fn parse_opt<T>(&self, column: &str) -> Result<Option<T>, ValidationError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(column) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ValidationError::invalid_format(column, e.to_string())),
        }
    }

    /// Reads a boolean cell. Blank cells yield `default`.
    pub fn flag(&self, column: &str, default: bool) -> Result<bool, ValidationError> {
        match self.optional(column).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "true" | "yes" | "y" | "1" => Ok(true),
                "false" | "no" | "n" | "0" => Ok(false),
                other => Err(ValidationError::invalid_format(
                    column,
                    format!("'{}' is not a boolean", other),
                )),
            },
        }
    }

    /// Reads a comma separated list cell.
    pub fn list(&self, column: &str) -> Vec<String> {
        self.optional(column)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterates columns in header order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StorageRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = StorageRow::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_are_missing() {
        let row = StorageRow::new().with("notes", "   ");
        assert_eq!(row.optional("notes"), None);
        assert_eq!(
            row.required("notes").unwrap_err(),
            ValidationError::empty_field("notes")
        );
    }

    #[test]
    fn parse_reports_column_on_failure() {
        let row = StorageRow::new().with("length", "thirty");
        let err = row.parse::<u32>("length").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "length"));
    }

    #[test]
    fn flag_accepts_sheet_spellings() {
        let row = StorageRow::new().with("isActive", "Yes").with("archived", "0");
        assert!(row.flag("isActive", false).unwrap());
        assert!(!row.flag("archived", true).unwrap());
        assert!(row.flag("missing", true).unwrap());
        assert!(StorageRow::new().with("x", "maybe").flag("x", false).is_err());
    }

    #[test]
    fn list_splits_and_trims() {
        let row = StorageRow::new().with("instruments", "Piano, Violin,,Cello ");
        assert_eq!(row.list("instruments"), vec!["Piano", "Violin", "Cello"]);
        assert!(row.list("absent").is_empty());
    }

    #[test]
    fn collects_from_pairs() {
        let row: StorageRow = vec![("id", "S1"), ("grade", "3")].into_iter().collect();
        assert_eq!(row.parse::<u8>("grade").unwrap(), 3);
        assert_eq!(row.columns().count(), 2);
    }
}
