//! In-memory [`AirtableApi`] for tests.
//!
//! `MockAirtable` stores records per `(base, table)`, paginates listings by
//! the requested page size, records every call it receives and can be told
//! to fail the next N requests of a given kind.

use crate::api::{AirtableApi, PageQuery};
use crate::error::ApiError;
use crate::models::{BaseSchema, CreateRecords, Record, RecordPage, UpdateRecords};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A request received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    BaseSchema {
        base: String,
    },
    ListRecords {
        base: String,
        table: String,
        query: PageQuery,
    },
    CreateRecords {
        base: String,
        table: String,
        body: CreateRecords,
    },
    UpdateRecords {
        base: String,
        table: String,
        body: UpdateRecords,
    },
}

#[derive(Debug, Default)]
struct MockState {
    schemas: HashMap<String, BaseSchema>,
    tables: HashMap<(String, String), Vec<Record>>,
    schema_failures: u32,
    list_failures: u32,
    mutation_failures: u32,
    calls: Vec<ApiCall>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct MockAirtable {
    state: Mutex<MockState>,
}

fn unavailable(base: &str, path: &str) -> ApiError {
    ApiError::Status {
        url: format!("mock://{base}/{path}"),
        status: 503,
        body: "Service Unavailable".to_string(),
    }
}

fn not_found(base: &str, path: &str) -> ApiError {
    ApiError::Status {
        url: format!("mock://{base}/{path}"),
        status: 404,
        body: "NOT_FOUND".to_string(),
    }
}

/// Consumes one scripted failure, returning whether the request must fail.
fn take_failure(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

impl MockAirtable {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `schema` for `base` from the metadata endpoint.
    pub fn with_schema(self, base: &str, schema: BaseSchema) -> Self {
        self.state().schemas.insert(base.to_string(), schema);
        self
    }

    /// Seed a table with records. Also makes an empty table listable.
    pub fn with_records(self, base: &str, table: &str, records: Vec<Record>) -> Self {
        self.state()
            .tables
            .insert((base.to_string(), table.to_string()), records);
        self
    }

    pub fn fail_next_schema_requests(&self, n: u32) {
        self.state().schema_failures = n;
    }

    pub fn fail_next_list_requests(&self, n: u32) {
        self.state().list_failures = n;
    }

    pub fn fail_next_mutations(&self, n: u32) {
        self.state().mutation_failures = n;
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Current contents of a table.
    pub fn records(&self, base: &str, table: &str) -> Vec<Record> {
        self.state()
            .tables
            .get(&(base.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Bodies of all create calls, in order.
    pub fn create_calls(&self) -> Vec<CreateRecords> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::CreateRecords { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Bodies of all update calls, in order.
    pub fn update_calls(&self) -> Vec<UpdateRecords> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::UpdateRecords { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn list_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::ListRecords { .. }))
            .count()
    }

    pub fn schema_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::BaseSchema { .. }))
            .count()
    }
}

#[async_trait::async_trait]
impl AirtableApi for MockAirtable {
    async fn base_schema(&self, base: &str) -> Result<BaseSchema, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::BaseSchema {
            base: base.to_string(),
        });
        if take_failure(&mut state.schema_failures) {
            return Err(unavailable(base, "meta"));
        }
        state
            .schemas
            .get(base)
            .cloned()
            .ok_or_else(|| not_found(base, "meta"))
    }

    async fn list_records(
        &self,
        base: &str,
        table: &str,
        query: &PageQuery,
    ) -> Result<RecordPage, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::ListRecords {
            base: base.to_string(),
            table: table.to_string(),
            query: query.clone(),
        });
        if take_failure(&mut state.list_failures) {
            return Err(unavailable(base, table));
        }

        let records = state
            .tables
            .get(&(base.to_string(), table.to_string()))
            .ok_or_else(|| not_found(base, table))?;

        let total = records.len().min(query.max_records as usize);
        let start = match &query.offset {
            Some(offset) => offset.parse::<usize>().map_err(|_| ApiError::Status {
                url: format!("mock://{base}/{table}"),
                status: 422,
                body: "LIST_RECORDS_ITERATOR_NOT_AVAILABLE".to_string(),
            })?,
            None => 0,
        };
        let end = (start + query.page_size.max(1) as usize).min(total);
        let start = start.min(end);

        Ok(RecordPage {
            records: records[start..end].to_vec(),
            offset: (end < total).then(|| end.to_string()),
        })
    }

    async fn create_records(
        &self,
        base: &str,
        table: &str,
        body: &CreateRecords,
    ) -> Result<Vec<Record>, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::CreateRecords {
            base: base.to_string(),
            table: table.to_string(),
            body: body.clone(),
        });
        if take_failure(&mut state.mutation_failures) {
            return Err(unavailable(base, table));
        }

        let mut created = Vec::with_capacity(body.records.len());
        for new_record in &body.records {
            state.next_id += 1;
            created.push(Record {
                id: format!("recMock{:05}", state.next_id),
                fields: new_record.fields.clone(),
                created_time: None,
            });
        }
        state
            .tables
            .entry((base.to_string(), table.to_string()))
            .or_default()
            .extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_records(
        &self,
        base: &str,
        table: &str,
        body: &UpdateRecords,
    ) -> Result<Vec<Record>, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::UpdateRecords {
            base: base.to_string(),
            table: table.to_string(),
            body: body.clone(),
        });
        if take_failure(&mut state.mutation_failures) {
            return Err(unavailable(base, table));
        }

        let records = state
            .tables
            .get_mut(&(base.to_string(), table.to_string()))
            .ok_or_else(|| not_found(base, table))?;

        let mut updated = Vec::with_capacity(body.records.len());
        for update in &body.records {
            let record = records
                .iter_mut()
                .find(|r| r.id == update.id)
                .ok_or_else(|| not_found(base, &format!("{table}/{}", update.id)))?;
            record.fields.extend(update.fields.clone());
            updated.push(record.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRecord;
    use serde_json::{json, Map};

    fn record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            fields: Map::new(),
            created_time: None,
        }
    }

    #[tokio::test]
    async fn test_paginates_by_page_size() {
        let records = (0..5).map(|i| record(&format!("rec{i}"))).collect();
        let mock = MockAirtable::new().with_records("app", "T", records);

        let mut query = PageQuery {
            page_size: 2,
            ..PageQuery::default()
        };
        let mut sizes = vec![];
        loop {
            let page = mock.list_records("app", "T", &query).await.unwrap();
            sizes.push(page.records.len());
            match page.offset {
                Some(offset) => query.offset = Some(offset),
                None => break,
            }
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed() {
        let mock = MockAirtable::new().with_records("app", "T", vec![]);
        mock.fail_next_list_requests(1);

        let query = PageQuery::default();
        tokio_test::assert_err!(mock.list_records("app", "T", &query).await);
        tokio_test::assert_ok!(mock.list_records("app", "T", &query).await);
        assert_eq!(mock.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_created_records_can_be_updated() {
        let mock = MockAirtable::new();
        let mut fields = Map::new();
        fields.insert("Name".to_string(), json!("x"));
        let created = mock
            .create_records(
                "app",
                "T",
                &CreateRecords {
                    records: vec![NewRecord { fields }],
                    typecast: false,
                },
            )
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("Name".to_string(), json!("y"));
        mock.update_records(
            "app",
            "T",
            &UpdateRecords {
                records: vec![crate::models::RecordUpdate {
                    id: created[0].id.clone(),
                    fields,
                }],
                typecast: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(mock.records("app", "T")[0].fields["Name"], json!("y"));
    }
}
