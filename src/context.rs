//! Shared per-run state handed to every reader and writer.

use airtable_client::{AirtableApi, RateLimiter, RetryPolicy};
use airtable_sink::BatchWriter;
use airtable_source::{PaginatedReader, SchemaCache, SchemaTranslator};
use std::fmt;
use std::sync::Arc;

/// API handle, call throttle, schema cache and read retry policy of one run.
///
/// Cloning is cheap; every clone shares the same limiter and cache, so all
/// calls made through readers and writers built from it count against one
/// request budget.
#[derive(Clone)]
pub struct SyncContext {
    pub api: Arc<dyn AirtableApi>,
    pub limiter: Arc<RateLimiter>,
    pub schema_cache: Arc<SchemaCache>,
    pub retry: RetryPolicy,
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("limiter", &self.limiter)
            .field("cached_bases", &self.schema_cache.len())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SyncContext {
    pub fn new(api: Arc<dyn AirtableApi>) -> Self {
        Self {
            api,
            limiter: Arc::new(RateLimiter::default()),
            schema_cache: Arc::new(SchemaCache::new()),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_schema_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.schema_cache = cache;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn translator(&self) -> SchemaTranslator {
        SchemaTranslator::new(
            self.api.clone(),
            self.limiter.clone(),
            self.schema_cache.clone(),
        )
    }

    pub fn reader(&self, base: &str, table: &str, view: Option<&str>) -> PaginatedReader {
        PaginatedReader::new(self.api.clone(), self.limiter.clone(), base, table)
            .with_view(view.map(str::to_string))
            .with_retry_policy(self.retry)
    }

    pub fn writer(&self, base: &str, table: &str) -> BatchWriter {
        BatchWriter::new(self.api.clone(), self.limiter.clone(), base, table)
    }
}
