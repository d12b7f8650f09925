//! Minimal streaming pipeline: packages of lazily produced resources.
//!
//! A [`Package`] is an ordered list of [`Resource`]s. Each resource is a name,
//! an optional declared schema and a single-use row stream. [`Step`]s rewrite
//! a package without pulling any rows; rows only move when the final consumer
//! drains the resources, one resource at a time, in package order.

use airtable_source::RowStream;
use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use sync_core::{Row, TableDefinition};

/// One named stream of rows.
pub struct Resource {
    pub name: String,
    pub schema: Option<TableDefinition>,
    pub rows: RowStream,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Resource {
    pub fn new(name: impl Into<String>, rows: RowStream) -> Self {
        Self {
            name: name.into(),
            schema: None,
            rows,
        }
    }

    /// A resource with no rows.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, stream::empty().boxed())
    }

    /// A resource over rows already in memory.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self::new(name, stream::iter(rows.into_iter().map(Ok)).boxed())
    }

    pub fn with_schema(mut self, schema: TableDefinition) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Pull every row into memory.
    pub async fn collect(self) -> Result<Vec<Row>> {
        let name = self.name;
        self.rows
            .try_collect::<Vec<Row>>()
            .await
            .with_context(|| format!("Failed to read resource {name}"))
    }
}

/// Ordered collection of resources flowing between steps.
#[derive(Debug, Default)]
pub struct Package {
    resources: Vec<Resource>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.name == name)
    }

    pub fn last_mut(&mut self) -> Option<&mut Resource> {
        self.resources.last_mut()
    }

    /// Remove and return the resource called `name`.
    pub fn take(&mut self, name: &str) -> Option<Resource> {
        let index = self.resources.iter().position(|r| r.name == name)?;
        Some(self.resources.remove(index))
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }

    /// Rebuild the package with `f` applied to every resource, in order.
    pub fn map_resources<F>(self, f: F) -> Result<Self>
    where
        F: FnMut(Resource) -> Result<Resource>,
    {
        let resources = self
            .resources
            .into_iter()
            .map(f)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { resources })
    }

    /// Drain every resource in order, returning `(name, row count)` pairs.
    pub async fn drain(self) -> Result<Vec<(String, usize)>> {
        let mut counts = Vec::with_capacity(self.resources.len());
        for resource in self.resources {
            let name = resource.name;
            let count = resource
                .rows
                .try_fold(0usize, |n, _| async move { Ok::<_, anyhow::Error>(n + 1) })
                .await
                .with_context(|| format!("Failed to process resource {name}"))?;
            tracing::info!("Processed {} rows of resource {}", count, name);
            counts.push((name, count));
        }
        Ok(counts)
    }
}

/// A package-to-package rewrite.
///
/// Steps run eagerly when a flow is processed but must not pull rows; any
/// row-level work is wired into the resources' streams.
pub trait Step: Send {
    fn apply(self: Box<Self>, package: Package) -> Result<Package>;
}

/// Sequence of steps, itself usable as a step.
#[derive(Default)]
pub struct Flow {
    steps: Vec<Box<dyn Step>>,
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step to `package`, in order.
    pub fn process(self, package: Package) -> Result<Package> {
        self.steps
            .into_iter()
            .try_fold(package, |package, step| step.apply(package))
    }
}

impl Step for Flow {
    fn apply(self: Box<Self>, package: Package) -> Result<Package> {
        self.process(package)
    }
}

// ============================================================================
// Built-in steps
// ============================================================================

/// Append a resource at the end of the package.
pub struct AddResource(pub Resource);

impl Step for AddResource {
    fn apply(self: Box<Self>, mut package: Package) -> Result<Package> {
        tracing::debug!("Adding resource {}", self.0.name);
        package.push(self.0);
        Ok(package)
    }
}

/// Rename the last resource of the package.
pub struct RenameLast(pub String);

impl Step for RenameLast {
    fn apply(self: Box<Self>, mut package: Package) -> Result<Package> {
        let resource = package
            .last_mut()
            .ok_or_else(|| anyhow!("Cannot rename resource to {}: package is empty", self.0))?;
        tracing::debug!("Renaming resource {} to {}", resource.name, self.0);
        resource.name = self.0;
        if let Some(schema) = resource.schema.as_mut() {
            schema.name = resource.name.clone();
        }
        Ok(package)
    }
}

/// Append an empty resource named after `schema` that declares its columns.
///
/// The resource is a placeholder: a later [`ReplaceRows`] supplies the rows.
pub struct DeclareResource(pub TableDefinition);

impl Step for DeclareResource {
    fn apply(self: Box<Self>, mut package: Package) -> Result<Package> {
        if package.get(&self.0.name).is_some() {
            anyhow::bail!("Resource {} already exists", self.0.name);
        }
        tracing::debug!(
            "Declaring resource {} with {} columns",
            self.0.name,
            self.0.columns.len()
        );
        package.push(Resource::empty(self.0.name.clone()).with_schema(self.0));
        Ok(package)
    }
}

/// Substitute the rows of an existing resource, keeping its schema.
pub struct ReplaceRows {
    pub resource: String,
    pub rows: RowStream,
}

impl Step for ReplaceRows {
    fn apply(self: Box<Self>, mut package: Package) -> Result<Package> {
        let ReplaceRows { resource, rows } = *self;
        let target = package
            .get_mut(&resource)
            .ok_or_else(|| anyhow!("Resource {resource} not found in package"))?;
        target.rows = rows;
        Ok(package)
    }
}
