//! Run configuration: table mappings and secret resolution.
//!
//! The mapping file is TOML with one `[[tables]]` entry per destination:
//!
//! ```toml
//! [[tables]]
//! base = "appXXXXXXXXXXXXXX"
//! table = "Tasks"
//! resource-name = "tasks"
//! typecast = true
//! ```

mod duration;

pub use duration::parse_duration;

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Prefix marking a secret that is read from an environment variable.
pub const ENV_SECRET_PREFIX: &str = "env://";

/// One destination table fed by a named resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableMapping {
    pub base: String,
    pub table: String,
    #[serde(rename = "resource-name")]
    pub resource_name: String,
    #[serde(default)]
    pub typecast: bool,
}

/// Parsed mapping file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    #[serde(default)]
    pub tables: Vec<TableMapping>,
}

impl SyncConfig {
    /// Load and validate a mapping file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse and validate mappings from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: SyncConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject blank fields and repeated `(base, table)` destinations.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for (i, mapping) in self.tables.iter().enumerate() {
            for (key, value) in [
                ("base", &mapping.base),
                ("table", &mapping.table),
                ("resource-name", &mapping.resource_name),
            ] {
                if value.trim().is_empty() {
                    anyhow::bail!("tables[{i}]: '{key}' must not be empty");
                }
            }
            if !seen.insert((mapping.base.as_str(), mapping.table.as_str())) {
                anyhow::bail!(
                    "tables[{i}]: destination {}/{} is mapped more than once",
                    mapping.base,
                    mapping.table
                );
            }
        }
        Ok(())
    }

    /// Mappings fed by resource `name`, in file order.
    pub fn mappings_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TableMapping> {
        self.tables.iter().filter(move |m| m.resource_name == name)
    }
}

/// Resolve a secret given either literally or as `env://VAR`.
pub fn resolve_secret(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix(ENV_SECRET_PREFIX) {
        Some(var) => std::env::var(var)
            .with_context(|| format!("Environment variable {var} is not set")),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[[tables]]
base = "app1"
table = "Tasks"
resource-name = "tasks"

[[tables]]
base = "app2"
table = "Archive"
resource-name = "tasks"
typecast = true
"#;

    #[test]
    fn test_parse_mappings() {
        let config = SyncConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.tables[0].resource_name, "tasks");
        assert!(!config.tables[0].typecast);
        assert!(config.tables[1].typecast);
        assert_eq!(config.mappings_for("tasks").count(), 2);
        assert_eq!(config.mappings_for("other").count(), 0);
    }

    #[test]
    fn test_empty_file_has_no_mappings() {
        assert!(SyncConfig::from_toml_str("").unwrap().tables.is_empty());
    }

    #[test]
    fn test_rejects_unknown_keys_and_blanks() {
        let unknown = "[[tables]]\nbase = \"a\"\ntable = \"t\"\nresource-name = \"r\"\nview = \"v\"\n";
        tokio_test::assert_err!(SyncConfig::from_toml_str(unknown));

        let blank = "[[tables]]\nbase = \" \"\ntable = \"t\"\nresource-name = \"r\"\n";
        let err = SyncConfig::from_toml_str(blank).unwrap_err();
        assert!(format!("{err:#}").contains("'base' must not be empty"));
    }

    #[test]
    fn test_rejects_duplicate_destination() {
        let dup = "[[tables]]\nbase = \"a\"\ntable = \"t\"\nresource-name = \"r1\"\n\
                   [[tables]]\nbase = \"a\"\ntable = \"t\"\nresource-name = \"r2\"\n";
        let err = SyncConfig::from_toml_str(dup).unwrap_err();
        assert!(err.to_string().contains("a/t is mapped more than once"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = SyncConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tables[1].table, "Archive");

        let err = SyncConfig::from_file("/nonexistent/tables.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_resolve_secret() {
        assert_eq!(resolve_secret("pat123").unwrap(), "pat123");

        std::env::set_var("AIRTABLE_SYNC_TEST_SECRET", "from-env");
        assert_eq!(
            resolve_secret("env://AIRTABLE_SYNC_TEST_SECRET").unwrap(),
            "from-env"
        );

        let err = resolve_secret("env://AIRTABLE_SYNC_TEST_UNSET_SECRET").unwrap_err();
        assert!(err.to_string().contains("AIRTABLE_SYNC_TEST_UNSET_SECRET"));
    }
}
