//! Error types for loading game data and placeables.

use std::fmt;

use crate::resources::ResourceType;

/// An error raised while loading a resource, a record, a table or a placeable.
#[derive(Debug)]
pub enum LoadError {
    /// No provider has data for this name and type.
    ResourceNotFound { name: String, kind: ResourceType },
    /// The provider failed while reading the resource (I/O and friends).
    Resource { name: String, source: anyhow::Error },
    /// The data is not the expected record type or format version.
    FormatMismatch {
        name: String,
        expected: String,
        found: String,
    },
    /// The data is truncated or points outside of itself.
    Malformed { name: String, reason: String },
    /// A record lacks a field the loader cannot do without.
    MissingRequiredField { record: String, field: String },
    /// A field exists but does not hold the requested type.
    FieldType {
        field: String,
        expected: &'static str,
    },
    /// A table has no column with this header.
    MissingColumn { table: String, column: String },
    /// A row index lies beyond the end of a table.
    RowOutOfRange { table: String, row: usize, rows: usize },
}

impl LoadError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        LoadError::Malformed {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::ResourceNotFound { name, kind } => {
                write!(f, "No such resource: {name}.{}", kind.extension())
            }
            LoadError::Resource { name, source } => {
                write!(f, "Failed to read resource {name}: {source}")
            }
            LoadError::FormatMismatch {
                name,
                expected,
                found,
            } => write!(f, "{name}: expected {expected:?}, found {found:?}"),
            LoadError::Malformed { name, reason } => write!(f, "{name} is malformed: {reason}"),
            LoadError::MissingRequiredField { record, field } => {
                write!(f, "{record} has no \"{field}\" field")
            }
            LoadError::FieldType { field, expected } => {
                write!(f, "Field \"{field}\" is not of type {expected}")
            }
            LoadError::MissingColumn { table, column } => {
                write!(f, "Table {table} has no column \"{column}\"")
            }
            LoadError::RowOutOfRange { table, row, rows } => {
                write!(f, "Row {row} is out of range for table {table} ({rows} rows)")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Resource { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
