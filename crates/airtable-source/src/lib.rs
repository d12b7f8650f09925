//! Airtable to pipeline: schema discovery and record reads.
//!
//! - [`SchemaTranslator`] turns a table's field metadata into column
//!   declarations, caching metadata per base in a shared [`SchemaCache`].
//! - [`PaginatedReader`] streams every record of a table page by page.

mod reader;
mod schema;
pub mod types;

pub use reader::{PaginatedReader, RowStream};
pub use schema::{SchemaCache, SchemaTranslator};
pub use types::{logical_type, DATETIME_FORMAT, DATE_FORMAT};
