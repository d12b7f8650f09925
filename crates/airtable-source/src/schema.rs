//! Schema discovery: remote field metadata to column declarations.

use crate::types::{format_for, logical_type};
use airtable_client::{AirtableApi, ApiError, BaseSchema, RateLimiter, TableSchema};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use sync_core::{ColumnDefinition, LogicalType, SchemaError, TableDefinition, AIRTABLE_ID_FIELD};

/// Base metadata fetched so far, keyed by base id.
///
/// Entries are never invalidated: a cache that outlives one run serves the
/// metadata seen on first lookup. Create a fresh cache per run when the
/// remote schema may change in between.
#[derive(Debug, Default)]
pub struct SchemaCache {
    bases: Mutex<HashMap<String, Arc<BaseSchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, base: &str) -> Option<Arc<BaseSchema>> {
        self.bases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(base)
            .cloned()
    }

    pub fn insert(&self, base: &str, schema: BaseSchema) -> Arc<BaseSchema> {
        let schema = Arc::new(schema);
        self.bases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(base.to_string(), schema.clone());
        schema
    }

    pub fn len(&self) -> usize {
        self.bases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces column declarations for remote tables.
#[derive(Clone)]
pub struct SchemaTranslator {
    api: Arc<dyn AirtableApi>,
    limiter: Arc<RateLimiter>,
    cache: Arc<SchemaCache>,
}

impl SchemaTranslator {
    pub fn new(
        api: Arc<dyn AirtableApi>,
        limiter: Arc<RateLimiter>,
        cache: Arc<SchemaCache>,
    ) -> Self {
        Self {
            api,
            limiter,
            cache,
        }
    }

    /// Metadata of `base`, fetched at most once per cache.
    pub async fn base_schema(&self, base: &str) -> Result<Arc<BaseSchema>, ApiError> {
        if let Some(schema) = self.cache.get(base) {
            tracing::debug!("Using cached schema for base {}", base);
            return Ok(schema);
        }

        tracing::debug!("Fetching schema for base {}", base);
        let schema = self
            .limiter
            .execute(|| self.api.base_schema(base))
            .await?;
        Ok(self.cache.insert(base, schema))
    }

    /// Column declarations of `table`, optionally restricted to a view.
    ///
    /// Returns `Ok(None)` when the metadata cannot be fetched or the table or
    /// view does not exist; the caller then reads untyped. The reason is
    /// logged. Only an unmappable field type is an error.
    pub async fn describe_table(
        &self,
        base: &str,
        table: &str,
        view: Option<&str>,
    ) -> Result<Option<TableDefinition>, SchemaError> {
        let schema = match self.base_schema(base).await {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!("Error fetching schema for base {}: {}", base, e);
                return Ok(None);
            }
        };

        let Some(table_schema) = schema.find_table(table) else {
            tracing::warn!("Failed to find table {} in base {} schema", table, base);
            return Ok(None);
        };

        let visible = match view {
            None => None,
            Some(view_name) => match table_schema.find_view(view_name) {
                Some(v) => v
                    .visible_field_ids
                    .as_ref()
                    .map(|ids| ids.iter().map(String::as_str).collect::<HashSet<_>>()),
                None => {
                    tracing::warn!(
                        "Failed to find view {} of table {} in base {} schema",
                        view_name,
                        table,
                        base
                    );
                    return Ok(None);
                }
            },
        };

        translate_table(table, table_schema, visible.as_ref()).map(Some)
    }
}

/// Declarations for `table_schema`, named `name`.
///
/// The identifier column comes first, then every field in remote order,
/// skipping fields outside `visible` when a visibility set is given.
pub fn translate_table(
    name: &str,
    table_schema: &TableSchema,
    visible: Option<&HashSet<&str>>,
) -> Result<TableDefinition, SchemaError> {
    let mut definition = TableDefinition::new(name);
    definition.add_column(ColumnDefinition::new(
        AIRTABLE_ID_FIELD,
        LogicalType::String,
    ))?;

    for field in &table_schema.fields {
        if let Some(visible) = visible {
            if !visible.contains(field.id.as_str()) {
                tracing::trace!("Skipping field {} hidden in view", field.name);
                continue;
            }
        }

        let logical =
            logical_type(&field.field_type).ok_or_else(|| SchemaError::UnknownFieldType {
                table: name.to_string(),
                field: field.name.clone(),
                field_type: field.field_type.clone(),
            })?;

        let mut column = ColumnDefinition::new(&field.name, logical);
        if let Some(format) = format_for(logical) {
            column = column.with_format(format);
        }
        definition.add_column(column)?;
    }

    tracing::debug!(
        "Declared {} columns for table {}",
        definition.columns.len(),
        name
    );
    Ok(definition)
}
