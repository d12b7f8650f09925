//! Pipeline to Airtable: batched record writes.
//!
//! A [`BatchWriter`] is bound to one `(base, table)` destination and
//! accumulates pre-classified inserts and updates, flushing each kind in
//! batches of at most [`airtable_client::MAX_BATCH_SIZE`] records.

mod writer;

pub use writer::{BatchWriter, WriteStats};
