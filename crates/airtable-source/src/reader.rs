//! Paginated record retrieval.

use airtable_client::{AirtableApi, PageQuery, RateLimiter, RecordPage, RetryPolicy};
use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use sync_core::Row;

/// Lazily produced rows of one resource.
pub type RowStream = BoxStream<'static, Result<Row>>;

/// Reads every record of one table, one page at a time.
///
/// A page is requested only after every row of the previous page has been
/// pulled by the consumer, so at most one page is held in memory.
#[derive(Clone)]
pub struct PaginatedReader {
    api: Arc<dyn AirtableApi>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    base: String,
    table: String,
    view: Option<String>,
}

struct ReadState {
    reader: PaginatedReader,
    query: PageQuery,
    buffer: VecDeque<Row>,
    exhausted: bool,
    pages: u32,
    count: usize,
}

impl PaginatedReader {
    pub fn new(
        api: Arc<dyn AirtableApi>,
        limiter: Arc<RateLimiter>,
        base: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            api,
            limiter,
            retry: RetryPolicy::default(),
            base: base.into(),
            table: table.into(),
            view: None,
        }
    }

    /// Restrict the listing to the records of a view.
    pub fn with_view(mut self, view: Option<String>) -> Self {
        self.view = view;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Stream every record as a row, in the order the store returns them.
    ///
    /// Each row carries the record id under [`sync_core::AIRTABLE_ID_FIELD`]
    /// followed by the record's fields. A page that still fails after the
    /// retry policy is exhausted ends the stream with that error.
    pub fn records(self) -> RowStream {
        let state = ReadState {
            query: PageQuery::for_view(self.view.clone()),
            reader: self,
            buffer: VecDeque::new(),
            exhausted: false,
            pages: 0,
            count: 0,
        };

        stream::try_unfold(state, |mut state| async move {
            loop {
                if let Some(row) = state.buffer.pop_front() {
                    return Ok::<_, anyhow::Error>(Some((row, state)));
                }
                if state.exhausted {
                    return Ok(None);
                }

                state.pages += 1;
                let page = state.reader.fetch_page(&state.query, state.pages).await?;

                state.count += page.records.len();
                tracing::info!(
                    "Loaded {} records for {}/{}",
                    state.count,
                    state.reader.base,
                    state.reader.table
                );

                // An empty cursor ends the listing like a missing one.
                match page.offset {
                    Some(offset) if !offset.is_empty() => state.query.offset = Some(offset),
                    _ => state.exhausted = true,
                }
                state.buffer.extend(
                    page.records
                        .into_iter()
                        .map(|record| Row::from_record(record.id, record.fields)),
                );
            }
        })
        .boxed()
    }

    async fn fetch_page(&self, query: &PageQuery, page_number: u32) -> Result<RecordPage> {
        if page_number == 1 {
            tracing::info!("Loading records for {}/{}...", self.base, self.table);
        }
        let what = format!("Fetching page {} of {}/{}", page_number, self.base, self.table);

        self.retry
            .run(&what, |_| {
                self.limiter
                    .execute(|| self.api.list_records(&self.base, &self.table, query))
            })
            .await
            .with_context(|| {
                format!(
                    "Failed to fetch page {} of {}/{} after {} attempts",
                    page_number,
                    self.base,
                    self.table,
                    self.retry.max_attempts.max(1)
                )
            })
    }
}
