//! Write direction: push resources of a package to their mapped tables.

use crate::config::TableMapping;
use crate::context::SyncContext;
use crate::pipeline::{Package, Resource, Step};
use airtable_sink::BatchWriter;
use airtable_source::RowStream;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use sync_core::Row;

/// Pipeline step that mirrors rows into Airtable while passing them on.
///
/// Resources are matched to mappings by `resource-name`; a resource can feed
/// several tables and a resource without a mapping passes through
/// untouched. Rows carrying a non-null `__airtable_id` update that record in
/// every mapped table; all other rows are inserted. Pending batches are
/// flushed when the resource's stream ends, before the end is signalled
/// downstream.
pub struct DumpToAirtable {
    ctx: SyncContext,
    routes: HashMap<String, Vec<TableMapping>>,
}

impl DumpToAirtable {
    pub fn new(ctx: SyncContext, mappings: &[TableMapping]) -> Self {
        let mut routes: HashMap<String, Vec<TableMapping>> = HashMap::new();
        for mapping in mappings {
            routes
                .entry(mapping.resource_name.clone())
                .or_default()
                .push(mapping.clone());
        }
        Self { ctx, routes }
    }

    /// Mappings fed by resource `name`.
    pub fn routes_for(&self, name: &str) -> &[TableMapping] {
        self.routes.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Step for DumpToAirtable {
    fn apply(self: Box<Self>, package: Package) -> Result<Package> {
        let DumpToAirtable { ctx, routes } = *self;

        package.map_resources(|resource| {
            let Some(mappings) = routes.get(&resource.name) else {
                tracing::debug!("Resource {} has no table mapping", resource.name);
                return Ok(resource);
            };

            let writers: Vec<BatchWriter> = mappings
                .iter()
                .map(|m| ctx.writer(&m.base, &m.table).with_typecast(m.typecast))
                .collect();
            tracing::info!(
                "Writing resource {} to {}",
                resource.name,
                writers
                    .iter()
                    .map(|w| format!("{}/{}", w.base(), w.table()))
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let Resource { name, schema, rows } = resource;
            let rows = route_rows(name.clone(), rows, writers);
            Ok(Resource { name, schema, rows })
        })
    }
}

struct RouteState {
    resource: String,
    rows: RowStream,
    writers: Vec<BatchWriter>,
    count: usize,
}

/// Wrap `rows` so each row is written through `writers` before being yielded.
///
/// When `rows` is exhausted every writer is finalized, in mapping order.
fn route_rows(resource: String, rows: RowStream, writers: Vec<BatchWriter>) -> RowStream {
    let state = RouteState {
        resource,
        rows,
        writers,
        count: 0,
    };

    stream::try_unfold(state, |mut state| async move {
        match state.rows.next().await {
            Some(row) => {
                let row = row.with_context(|| {
                    format!("Failed to read row of resource {}", state.resource)
                })?;
                state.count += 1;
                write_row(&mut state.writers, &row)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to write row {} of resource {}",
                            state.count, state.resource
                        )
                    })?;
                Ok::<_, anyhow::Error>(Some((row, state)))
            }
            None => {
                for writer in std::mem::take(&mut state.writers) {
                    writer.finalize().await.with_context(|| {
                        format!("Failed to finish writing resource {}", state.resource)
                    })?;
                }
                tracing::info!(
                    "Wrote {} rows of resource {}",
                    state.count,
                    state.resource
                );
                Ok(None)
            }
        }
    })
    .boxed()
}

async fn write_row(writers: &mut [BatchWriter], row: &Row) -> Result<()> {
    let (id, fields) = row.clone().split_record_id();
    match id {
        Some(id) => {
            let id = match id {
                Value::String(id) => id,
                other => other.to_string(),
            };
            for writer in writers.iter_mut() {
                writer.update(id.as_str(), fields.clone()).await?;
            }
        }
        None => {
            for writer in writers.iter_mut() {
                writer.insert(fields.clone()).await?;
            }
        }
    }
    Ok(())
}
