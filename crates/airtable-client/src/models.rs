//! Wire types of the Airtable REST API.
//!
//! Only the parts of each payload that the sync engine reads are modelled;
//! unknown keys are ignored on deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Metadata
// ============================================================================

/// Response of `GET /meta/bases/{base}/tables`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseSchema {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl BaseSchema {
    /// Find a table by name, falling back to its id.
    pub fn find_table(&self, name_or_id: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.name == name_or_id)
            .or_else(|| self.tables.iter().find(|t| t.id == name_or_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_field_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub views: Vec<ViewSchema>,
}

impl TableSchema {
    /// Find a view by name, falling back to its id.
    pub fn find_view(&self, name_or_id: &str) -> Option<&ViewSchema> {
        self.views
            .iter()
            .find(|v| v.name == name_or_id)
            .or_else(|| self.views.iter().find(|v| v.id == name_or_id))
    }
}

/// One field declaration. `field_type` is the remote type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub view_type: String,
    /// Present only when requested with `include=visibleFieldIds`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_field_ids: Option<Vec<String>>,
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// Response of `GET /{base}/{table}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<Record>,
    /// Continuation cursor; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

// ============================================================================
// Mutations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Body of `POST /{base}/{table}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecords {
    pub records: Vec<NewRecord>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub typecast: bool,
}

/// Body of `PATCH /{base}/{table}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecords {
    pub records: Vec<RecordUpdate>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub typecast: bool,
}

/// Response of both mutation endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MutationResponse {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_base_schema() {
        let schema: BaseSchema = serde_json::from_value(json!({
            "tables": [{
                "id": "tblA",
                "name": "Tasks",
                "primaryFieldId": "fld1",
                "fields": [
                    {"id": "fld1", "name": "Name", "type": "singleLineText"},
                    {"id": "fld2", "name": "Due", "type": "date",
                     "options": {"dateFormat": {"name": "iso", "format": "YYYY-MM-DD"}}}
                ],
                "views": [
                    {"id": "viw1", "name": "Grid", "type": "grid", "visibleFieldIds": ["fld1"]}
                ]
            }]
        }))
        .unwrap();

        let table = schema.find_table("Tasks").unwrap();
        assert_eq!(table.fields.len(), 2);
        assert_eq!(table.fields[1].field_type, "date");
        assert_eq!(
            table.find_view("viw1").unwrap().visible_field_ids,
            Some(vec!["fld1".to_string()])
        );
    }

    #[test]
    fn test_find_table_by_id() {
        let schema: BaseSchema = serde_json::from_value(json!({
            "tables": [{"id": "tblA", "name": "Tasks", "fields": []}]
        }))
        .unwrap();

        assert_eq!(schema.find_table("tblA").unwrap().name, "Tasks");
        assert!(schema.find_table("Other").is_none());
    }

    #[test]
    fn test_page_without_offset_is_last() {
        let page: RecordPage =
            serde_json::from_value(json!({"records": [{"id": "rec1", "fields": {"a": 1}}]}))
                .unwrap();
        assert!(page.offset.is_none());
        assert_eq!(page.records[0].fields["a"], json!(1));
    }

    #[test]
    fn test_typecast_is_only_sent_when_enabled() {
        let body = CreateRecords {
            records: vec![],
            typecast: false,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"records": []}));

        let body = UpdateRecords {
            records: vec![],
            typecast: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"records": [], "typecast": true})
        );
    }
}
