//! Airtable REST API access for airtable-sync.
//!
//! This crate holds everything that talks to the remote store:
//!
//! - [`AirtableApi`] - The trait seam the reader, writer and schema translator call through
//! - [`HttpAirtable`] - `reqwest` implementation of the trait
//! - [`RateLimiter`] - Process-wide call throttle shared by every caller
//! - [`RetryPolicy`] - Bounded fixed-delay retry used for page fetches
//! - [`models`] - Wire types for metadata, record pages and mutations
//!
//! # Example
//!
//! ```ignore
//! use airtable_client::{AirtableApi, HttpAirtable, PageQuery, RateLimiter};
//!
//! let api = HttpAirtable::new("pat123")?;
//! let limiter = RateLimiter::default();
//! let page = limiter
//!     .execute(|| api.list_records("appXXX", "Tasks", &PageQuery::default()))
//!     .await?;
//! ```

mod api;
mod error;
mod http;
pub mod models;
mod rate_limiter;
mod retry;
pub mod testing;

pub use api::{AirtableApi, PageQuery, MAX_BATCH_SIZE, MAX_RECORDS, PAGE_SIZE};
pub use error::ApiError;
pub use http::{HttpAirtable, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};
pub use models::{
    BaseSchema, CreateRecords, FieldSchema, NewRecord, Record, RecordPage, RecordUpdate,
    TableSchema, UpdateRecords, ViewSchema,
};
pub use rate_limiter::{RateLimiter, DEFAULT_REQUESTS_PER_SECOND};
pub use retry::RetryPolicy;
