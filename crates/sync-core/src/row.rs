//! Row representation shared by both sync directions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved column carrying the remote record identifier.
///
/// Rows read from a table always carry it; rows written with it set (and
/// non-null) are treated as updates of that record.
pub const AIRTABLE_ID_FIELD: &str = "__airtable_id";

/// An ordered mapping from field name to value.
///
/// Field order is insertion order, so a row read from the remote store keeps
/// the identifier first followed by the record's fields as returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a row from a JSON value; `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Build a row for a remote record: the identifier first, then `fields`.
    pub fn from_record(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        let mut map = Map::with_capacity(fields.len() + 1);
        map.insert(AIRTABLE_ID_FIELD.to_string(), Value::String(id.into()));
        map.extend(fields);
        Self(map)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The remote record identifier, if present and non-null.
    pub fn record_id(&self) -> Option<&Value> {
        self.0.get(AIRTABLE_ID_FIELD).filter(|v| !v.is_null())
    }

    /// Split off the reserved identifier field.
    ///
    /// Returns the identifier (when present and non-null) and the remaining
    /// fields in their original order. A null identifier is dropped.
    pub fn split_record_id(self) -> (Option<Value>, Row) {
        let mut id = None;
        let rest = self
            .0
            .into_iter()
            .filter_map(|(k, v)| {
                if k == AIRTABLE_ID_FIELD {
                    if !v.is_null() {
                        id = Some(v);
                    }
                    None
                } else {
                    Some((k, v))
                }
            })
            .collect();
        (id, Row(rest))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        Value::Object(row.0)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
