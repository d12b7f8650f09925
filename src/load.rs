//! Read direction: one remote table as a pipeline resource.

use crate::context::SyncContext;
use crate::pipeline::{AddResource, DeclareResource, Flow, RenameLast, ReplaceRows, Resource};
use anyhow::Context;
use std::sync::atomic::{AtomicUsize, Ordering};

static RAW_RESOURCE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Build the flow that adds `table` of `base` to a package as a resource
/// named after the table.
///
/// The schema decision is made once, before any row is read. With a
/// declared schema the flow declares a typed placeholder and swaps in the
/// record stream; without one the raw stream is added and renamed. An
/// unmappable field type fails the call.
pub async fn load_from_airtable(
    ctx: &SyncContext,
    base: &str,
    table: &str,
    view: Option<&str>,
) -> anyhow::Result<Flow> {
    let schema = ctx
        .translator()
        .describe_table(base, table, view)
        .await
        .with_context(|| format!("Failed to describe table {base}/{table}"))?;

    let rows = ctx.reader(base, table, view).records();

    let flow = match schema {
        Some(schema) => {
            tracing::info!(
                "Loading {}/{} with {} declared columns",
                base,
                table,
                schema.columns.len()
            );
            Flow::new().add(DeclareResource(schema)).add(ReplaceRows {
                resource: table.to_string(),
                rows,
            })
        }
        None => {
            tracing::info!("Loading {}/{} without a declared schema", base, table);
            let n = RAW_RESOURCE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
            Flow::new()
                .add(AddResource(Resource::new(format!("res_{n}"), rows)))
                .add(RenameLast(table.to_string()))
        }
    };
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Package;
    use airtable_client::testing::MockAirtable;
    use airtable_client::{BaseSchema, RateLimiter, Record, RetryPolicy};
    use serde_json::{json, Map};
    use std::sync::Arc;
    use sync_core::{LogicalType, AIRTABLE_ID_FIELD};

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut fields = Map::new();
                fields.insert("Count".to_string(), json!(i));
                Record {
                    id: format!("rec{i}"),
                    fields,
                    created_time: None,
                }
            })
            .collect()
    }

    fn schema(field_type: &str) -> BaseSchema {
        serde_json::from_value(json!({
            "tables": [{"id": "tblA", "name": "Tasks",
                        "fields": [{"id": "fld1", "name": "Count", "type": field_type}]}]
        }))
        .unwrap()
    }

    fn context(mock: Arc<MockAirtable>) -> SyncContext {
        SyncContext::new(mock)
            .with_limiter(Arc::new(RateLimiter::unlimited()))
            .with_retry_policy(RetryPolicy::default().without_delay())
    }

    #[tokio::test]
    async fn test_declared_schema_resource() {
        let mock = Arc::new(
            MockAirtable::new()
                .with_schema("app", schema("number"))
                .with_records("app", "Tasks", records(3)),
        );

        let flow = load_from_airtable(&context(mock.clone()), "app", "Tasks", None)
            .await
            .unwrap();
        assert_eq!(flow.len(), 2);
        assert_eq!(mock.list_call_count(), 0);

        let mut package = flow.process(Package::new()).unwrap();
        assert_eq!(package.names(), vec!["Tasks"]);

        let resource = package.take("Tasks").unwrap();
        let schema = resource.schema.clone().unwrap();
        assert_eq!(schema.column_names(), vec![AIRTABLE_ID_FIELD, "Count"]);
        assert_eq!(schema.column_type("Count").unwrap(), LogicalType::Number);

        let rows = resource.collect().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].record_id(), Some(&json!("rec2")));
    }

    #[tokio::test]
    async fn test_falls_back_to_raw_rows_without_schema() {
        let mock = Arc::new(MockAirtable::new().with_records("app", "Tasks", records(2)));

        let flow = load_from_airtable(&context(mock), "app", "Tasks", None)
            .await
            .unwrap();
        let mut package = flow.process(Package::new()).unwrap();

        assert_eq!(package.names(), vec!["Tasks"]);
        let resource = package.take("Tasks").unwrap();
        assert!(resource.schema.is_none());
        assert_eq!(resource.collect().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_metadata_failure_falls_back() {
        let mock = Arc::new(
            MockAirtable::new()
                .with_schema("app", schema("number"))
                .with_records("app", "Tasks", records(1)),
        );
        mock.fail_next_schema_requests(1);

        let package = load_from_airtable(&context(mock), "app", "Tasks", None)
            .await
            .unwrap()
            .process(Package::new())
            .unwrap();

        assert!(package.get("Tasks").unwrap().schema.is_none());
    }

    #[tokio::test]
    async fn test_unknown_field_type_fails() {
        let mock = Arc::new(MockAirtable::new().with_schema("app", schema("aiText")));

        let err = load_from_airtable(&context(mock), "app", "Tasks", None)
            .await
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to describe table app/Tasks"));
        assert!(message.contains("aiText"));
    }

    #[tokio::test]
    async fn test_loaded_resource_appends_to_existing_package() {
        let mock = Arc::new(MockAirtable::new().with_records("app", "Tasks", records(1)));
        let package = Package::new().with_resource(Resource::empty("Existing"));

        let package = load_from_airtable(&context(mock), "app", "Tasks", None)
            .await
            .unwrap()
            .process(package)
            .unwrap();

        assert_eq!(package.names(), vec!["Existing", "Tasks"]);
    }
}
