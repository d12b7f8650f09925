//! Batch accumulation and flushing for one destination table.

use airtable_client::{
    AirtableApi, CreateRecords, NewRecord, RateLimiter, RecordUpdate, UpdateRecords,
    MAX_BATCH_SIZE,
};
use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use sync_core::Row;

/// Counters of what a writer sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub inserted: usize,
    pub updated: usize,
    pub insert_calls: usize,
    pub update_calls: usize,
}

/// Accumulates inserts and updates for one `(base, table)`.
///
/// Each pending batch is flushed the moment it reaches
/// [`MAX_BATCH_SIZE`] items; [`BatchWriter::finalize`] flushes whatever is
/// left. The batch is emptied before the request is sent, so a failed flush
/// is never re-sent by a later one.
pub struct BatchWriter {
    api: Arc<dyn AirtableApi>,
    limiter: Arc<RateLimiter>,
    base: String,
    table: String,
    typecast: bool,
    inserts: Vec<NewRecord>,
    updates: Vec<RecordUpdate>,
    stats: WriteStats,
}

impl fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchWriter")
            .field("base", &self.base)
            .field("table", &self.table)
            .field("pending_inserts", &self.inserts.len())
            .field("pending_updates", &self.updates.len())
            .finish()
    }
}

impl BatchWriter {
    pub fn new(
        api: Arc<dyn AirtableApi>,
        limiter: Arc<RateLimiter>,
        base: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            api,
            limiter,
            base: base.into(),
            table: table.into(),
            typecast: false,
            inserts: Vec::with_capacity(MAX_BATCH_SIZE),
            updates: Vec::with_capacity(MAX_BATCH_SIZE),
            stats: WriteStats::default(),
        }
    }

    /// Ask the store to coerce values to the destination field types.
    pub fn with_typecast(mut self, typecast: bool) -> Self {
        self.typecast = typecast;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn pending_inserts(&self) -> usize {
        self.inserts.len()
    }

    pub fn pending_updates(&self) -> usize {
        self.updates.len()
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Queue a new record.
    pub async fn insert(&mut self, row: Row) -> Result<()> {
        self.inserts.push(NewRecord {
            fields: row.into_map(),
        });
        if self.inserts.len() >= MAX_BATCH_SIZE {
            self.flush_inserts().await?;
        }
        Ok(())
    }

    /// Queue new field values for record `id`.
    pub async fn update(&mut self, id: impl Into<String>, fields: Row) -> Result<()> {
        self.updates.push(RecordUpdate {
            id: id.into(),
            fields: fields.into_map(),
        });
        if self.updates.len() >= MAX_BATCH_SIZE {
            self.flush_updates().await?;
        }
        Ok(())
    }

    /// Flush both pending batches and return the totals.
    pub async fn finalize(mut self) -> Result<WriteStats> {
        if !self.inserts.is_empty() {
            self.flush_inserts().await?;
        }
        if !self.updates.is_empty() {
            self.flush_updates().await?;
        }
        tracing::info!(
            "Finished writing to {}/{}: {} inserted, {} updated",
            self.base,
            self.table,
            self.stats.inserted,
            self.stats.updated
        );
        Ok(self.stats)
    }

    async fn flush_inserts(&mut self) -> Result<()> {
        let body = CreateRecords {
            records: std::mem::take(&mut self.inserts),
            typecast: self.typecast,
        };
        let count = body.records.len();
        tracing::debug!("Inserting {} records into {}/{}", count, self.base, self.table);

        self.limiter
            .execute(|| self.api.create_records(&self.base, &self.table, &body))
            .await
            .with_context(|| {
                format!(
                    "Failed to insert {} records into {}/{}",
                    count, self.base, self.table
                )
            })?;

        self.stats.inserted += count;
        self.stats.insert_calls += 1;
        Ok(())
    }

    async fn flush_updates(&mut self) -> Result<()> {
        let body = UpdateRecords {
            records: std::mem::take(&mut self.updates),
            typecast: self.typecast,
        };
        let count = body.records.len();
        tracing::debug!("Updating {} records in {}/{}", count, self.base, self.table);

        self.limiter
            .execute(|| self.api.update_records(&self.base, &self.table, &body))
            .await
            .with_context(|| {
                format!(
                    "Failed to update {} records in {}/{}",
                    count, self.base, self.table
                )
            })?;

        self.stats.updated += count;
        self.stats.update_calls += 1;
        Ok(())
    }
}
