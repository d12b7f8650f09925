//! The trait seam between the sync engine and the remote store.

use crate::error::ApiError;
use crate::models::{BaseSchema, CreateRecords, Record, RecordPage, UpdateRecords};
use serde::Serialize;

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Upper bound on records returned by one listing; effectively unbounded.
pub const MAX_RECORDS: u32 = 999_999;

/// Maximum records per create or update call.
pub const MAX_BATCH_SIZE: usize = 10;

/// Query parameters of a record listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_size: u32,
    pub max_records: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_records: MAX_RECORDS,
            view: None,
            offset: None,
        }
    }
}

impl PageQuery {
    /// A first-page query restricted to `view` when given.
    pub fn for_view(view: Option<String>) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }
}

/// Operations the sync engine performs against the remote store.
///
/// Implementations perform exactly one request per call. Rate limiting and
/// retries are the caller's business, so test doubles stay trivial.
#[async_trait::async_trait]
pub trait AirtableApi: Send + Sync {
    /// `GET /meta/bases/{base}/tables?include=visibleFieldIds`
    async fn base_schema(&self, base: &str) -> Result<BaseSchema, ApiError>;

    /// `GET /{base}/{table}` with the given page query.
    async fn list_records(
        &self,
        base: &str,
        table: &str,
        query: &PageQuery,
    ) -> Result<RecordPage, ApiError>;

    /// `POST /{base}/{table}`; returns the created records.
    async fn create_records(
        &self,
        base: &str,
        table: &str,
        body: &CreateRecords,
    ) -> Result<Vec<Record>, ApiError>;

    /// `PATCH /{base}/{table}`; returns the updated records.
    async fn update_records(
        &self,
        base: &str,
        table: &str,
        body: &UpdateRecords,
    ) -> Result<Vec<Record>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_parameters() {
        let query = PageQuery::for_view(Some("Grid".to_string()));
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pageSize": 100, "maxRecords": 999999, "view": "Grid"})
        );
    }

    #[test]
    fn test_offset_is_sent_when_set() {
        let query = PageQuery {
            offset: Some("itr1/rec9".to_string()),
            ..PageQuery::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["offset"], "itr1/rec9");
        assert!(json.get("view").is_none());
    }
}
