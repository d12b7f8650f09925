//! airtable-sync Library
//!
//! Moves tabular records between Airtable and a streaming row pipeline.
//!
//! # Features
//!
//! - Read: a table (optionally restricted to a view) becomes a resource whose
//!   columns are declared from the base metadata, streamed page by page
//! - Write: resources are routed to mapped tables, inserting new rows and
//!   updating rows that carry a record id, in batches of at most ten
//! - One request budget: every call of a run goes through a shared rate
//!   limiter
//!
//! # Crates
//!
//! - `airtable_client` - REST access, rate limiter, retry policy
//! - `airtable_source` - schema translation and paginated reads
//! - `airtable_sink` - batched writes
//! - `sync_core` - rows and column declarations
//!
//! # CLI Usage
//!
//! ```bash
//! # Export a table as JSON Lines
//! airtable-sync load --base appXXXXXXXXXXXXXX --table Tasks --output tasks.jsonl
//!
//! # Push a JSON Lines file to every table mapped to resource "tasks"
//! airtable-sync dump --config tables.toml --input tasks.jsonl --resource tasks
//! ```

use airtable_client::{HttpAirtable, RateLimiter, RetryPolicy};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

pub mod config;
pub mod context;
pub mod dump;
pub mod jsonl;
pub mod load;
pub mod pipeline;

pub use config::{parse_duration, resolve_secret, SyncConfig, TableMapping};
pub use context::SyncContext;
pub use dump::DumpToAirtable;
pub use load::load_from_airtable;
pub use pipeline::{Flow, Package, Resource, Step};

/// Connection and pacing options shared by every subcommand.
#[derive(Parser, Clone, Debug)]
pub struct AirtableOpts {
    /// API token, literal or `env://VARIABLE`
    #[arg(
        long,
        env = "AIRTABLE_API_KEY",
        default_value = "env://DATAFLOWS_AIRTABLE_TOKEN",
        hide_env_values = true
    )]
    pub api_key: String,

    /// API base URL
    #[arg(long, default_value = airtable_client::DEFAULT_API_URL, env = "AIRTABLE_API_URL")]
    pub api_url: String,

    /// Maximum API calls per second for the whole run (0 disables throttling)
    #[arg(long, default_value = "5")]
    pub requests_per_second: u32,

    /// Per-request timeout (e.g. "10s", "500ms")
    #[arg(long, default_value = "10s")]
    pub request_timeout: String,

    /// Attempts per page fetch, including the first
    #[arg(long, default_value = "3")]
    pub retry_attempts: u32,

    /// Wait between page fetch attempts (e.g. "5s")
    #[arg(long, default_value = "5s")]
    pub retry_delay: String,
}

impl AirtableOpts {
    pub fn retry_policy(&self) -> anyhow::Result<RetryPolicy> {
        let delay = parse_duration(&self.retry_delay)
            .with_context(|| format!("Invalid --retry-delay '{}'", self.retry_delay))?;
        Ok(RetryPolicy::new(self.retry_attempts, delay))
    }

    /// Resolve the token and build the HTTP client and shared run state.
    pub fn build_context(&self) -> anyhow::Result<SyncContext> {
        let token = resolve_secret(&self.api_key).context("Failed to resolve API key")?;
        let timeout = parse_duration(&self.request_timeout)
            .with_context(|| format!("Invalid --request-timeout '{}'", self.request_timeout))?;
        let api = HttpAirtable::with_options(&token, &self.api_url, timeout)
            .context("Failed to create Airtable client")?;

        tracing::debug!(
            "Using {} at {} requests/second",
            self.api_url,
            self.requests_per_second
        );
        Ok(SyncContext::new(Arc::new(api))
            .with_limiter(Arc::new(RateLimiter::new(self.requests_per_second)))
            .with_retry_policy(self.retry_policy()?))
    }
}
