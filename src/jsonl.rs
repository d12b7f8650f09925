//! JSON Lines files as pipeline resources.

use crate::pipeline::Resource;
use airtable_source::RowStream;
use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::io::{BufRead, Write};
use sync_core::Row;

/// Stream the objects of a JSON Lines source as rows.
///
/// Lines are read on demand. Blank lines are skipped; a line that is not a
/// JSON object yields an error naming its line number.
pub fn read_jsonl<R>(reader: R) -> RowStream
where
    R: BufRead + Send + 'static,
{
    let lines = reader.lines().enumerate();
    stream::iter(lines)
        .filter_map(|(index, line)| async move {
            let line_number = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(
                        Err::<Row, _>(e).with_context(|| format!("Failed to read line {line_number}")),
                    )
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            let value: serde_json::Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(e) => {
                    return Some(
                        Err::<Row, _>(e).with_context(|| format!("Invalid JSON on line {line_number}")),
                    )
                }
            };
            Some(
                Row::from_value(value)
                    .ok_or_else(|| anyhow!("Line {line_number} is not a JSON object")),
            )
        })
        .boxed()
}

/// Write every row of `resource` to `writer`, one JSON object per line.
///
/// Returns the number of rows written.
pub async fn write_jsonl<W>(resource: Resource, writer: &mut W) -> Result<usize>
where
    W: Write,
{
    let name = resource.name;
    let mut rows = resource.rows;
    let mut count = 0;

    while let Some(row) = rows
        .try_next()
        .await
        .with_context(|| format!("Failed to read resource {name}"))?
    {
        serde_json::to_writer(&mut *writer, &row)
            .with_context(|| format!("Failed to write row {} of {name}", count + 1))?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;

    tracing::info!("Wrote {} rows of resource {}", count, name);
    Ok(count)
}
