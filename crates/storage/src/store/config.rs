#![forbid(unsafe_code)]

use super::StoreError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "wagtailvc.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the store lives and how its connection is opened.
///
/// Deserializes from TOML; only `storage_dir` is required:
///
/// ```toml
/// storage_dir = "/home/me/.wagtail"
/// busy_timeout_ms = 2000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub storage_dir: PathBuf,
    #[serde(default = "default_db_file_name")]
    pub db_file_name: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Read-only stores never install or upgrade the schema.
    #[serde(default)]
    pub read_only: bool,
}

impl StoreConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            db_file_name: default_db_file_name(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            read_only: false,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(&self.db_file_name)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(StoreError::InvalidInput("storage_dir must not be empty"));
        }
        let name = self.db_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StoreError::InvalidInput(
                "db_file_name must be a plain file name",
            ));
        }
        Ok(())
    }
}

fn default_db_file_name() -> String {
    DEFAULT_DB_FILE_NAME.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_fills_defaults() {
        let config = StoreConfig::from_toml_str(r#"storage_dir = "/tmp/wt""#).unwrap();
        assert_eq!(config, StoreConfig::new("/tmp/wt"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/wt/wagtailvc.db"));
    }

    #[test]
    fn toml_overrides_every_field() {
        let config = StoreConfig::from_toml_str(
            r#"
            storage_dir = "/data"
            db_file_name = "history.db"
            busy_timeout_ms = 250
            read_only = true
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/data/history.db"));
        assert_eq!(config.busy_timeout_ms, 250);
        assert!(config.read_only);
    }

    #[test]
    fn toml_rejects_unknown_keys_and_nested_db_names() {
        let err = StoreConfig::from_toml_str("storage_dir = \"/d\"\ncolor = \"red\"").unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");

        let err = StoreConfig::from_toml_str("storage_dir = \"/d\"\ndb_file_name = \"a/b.db\"")
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
