//! Core types for the airtable-sync framework.
//!
//! This crate provides the foundational types shared by the reader, the
//! writer and the pipeline glue:
//!
//! - [`LogicalType`] - Pipeline-side column types that remote field types map onto
//! - [`ColumnDefinition`] / [`TableDefinition`] - Declared schema of a resource
//! - [`Row`] - An ordered field-name to value mapping flowing through the pipeline
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── airtable-client   (wire models, rate limiter, retry policy)
//!    ├─── airtable-source   (schema translation, paginated reads)
//!    └─── airtable-sink     (batched inserts and updates)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{Row, AIRTABLE_ID_FIELD};
//! use serde_json::json;
//!
//! let row = Row::from_value(json!({AIRTABLE_ID_FIELD: "recA", "Name": "x"})).unwrap();
//! assert_eq!(row.record_id(), Some(&json!("recA")));
//! ```

pub mod row;
pub mod schema;
pub mod types;

pub use row::{Row, AIRTABLE_ID_FIELD};
pub use schema::{ColumnDefinition, SchemaError, TableDefinition};
pub use types::LogicalType;
