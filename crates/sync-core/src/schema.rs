//! Schema definitions for pipeline resources.
//!
//! A [`TableDefinition`] is what a resource declares about its rows: an
//! ordered list of [`ColumnDefinition`]s. Declarations come from remote
//! metadata; when no declaration is available the resource stays untyped and
//! downstream consumers infer types from the rows themselves.

use crate::types::LogicalType;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Column declared twice in the same table
    #[error("Column '{column}' declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Column not found in table schema
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Remote field type with no logical counterpart
    #[error("Unknown field type '{field_type}' for field '{field}' in table '{table}'")]
    UnknownFieldType {
        table: String,
        field: String,
        field_type: String,
    },
}

// ============================================================================
// Definitions
// ============================================================================

/// Column definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Logical column type
    #[serde(rename = "type")]
    pub column_type: LogicalType,

    /// Parse/format pattern for temporal columns (chrono `strftime` syntax)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColumnDefinition {
    /// Create a new column definition without a format hint.
    pub fn new(name: impl Into<String>, column_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            column_type,
            format: None,
        }
    }

    /// Attach a format hint.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Declared schema of one resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDefinition {
    /// Resource (table) name
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column, rejecting duplicate names.
    pub fn add_column(&mut self, column: ColumnDefinition) -> Result<(), SchemaError> {
        if self.get_column(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the type of a column by name.
    pub fn column_type(&self, name: &str) -> Result<LogicalType, SchemaError> {
        self.get_column(name)
            .map(|c| c.column_type)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// All column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_definition_serde() {
        let col = ColumnDefinition::new("Due", LogicalType::Date).with_format("%Y-%m-%d");

        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Due", "type": "date", "format": "%Y-%m-%d"})
        );

        let parsed: ColumnDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, col);
    }

    #[test]
    fn test_format_is_omitted_when_absent() {
        let col = ColumnDefinition::new("Name", LogicalType::String);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Name", "type": "string"}));
    }

    #[test]
    fn test_add_column_keeps_order_and_rejects_duplicates() {
        let mut table = TableDefinition::new("Tasks");
        table
            .add_column(ColumnDefinition::new("b", LogicalType::Number))
            .unwrap();
        table
            .add_column(ColumnDefinition::new("a", LogicalType::String))
            .unwrap();
        assert_eq!(table.column_names(), vec!["b", "a"]);

        let err = table
            .add_column(ColumnDefinition::new("a", LogicalType::Any))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_column_type_lookup() {
        let mut table = TableDefinition::new("Tasks");
        table
            .add_column(ColumnDefinition::new("Count", LogicalType::Number))
            .unwrap();

        assert_eq!(table.column_type("Count").unwrap(), LogicalType::Number);
        assert!(matches!(
            table.column_type("Missing"),
            Err(SchemaError::ColumnNotFound { .. })
        ));
    }
}
