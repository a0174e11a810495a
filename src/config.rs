//! Tool configuration.
//!
//! Loads `rendition.toml`, which points the tool at its catalog and media
//! storage:
//!
//! ```toml
//! # All options are optional - defaults shown below
//! catalog = "catalog.json"   # Catalog document (apps, models, records)
//! media_root = "media"       # Storage root for sources and variations
//! # base_url = "/media"      # Public URL prefix; omit for no URLs
//! ```
//!
//! Config files are sparse — set only the values you want to override.
//! Unknown keys are rejected to catch typos early. A missing config file
//! is not an error; stock defaults apply, and CLI flags override either.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `rendition.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Path to the catalog document.
    pub catalog: String,
    /// Storage root directory for source images and variations.
    pub media_root: String,
    /// Public URL prefix for stored files. `None` means the storage
    /// backend has no URL capability.
    pub base_url: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            catalog: "catalog.json".to_string(),
            media_root: "media".to_string(),
            base_url: None,
        }
    }
}

impl ToolConfig {
    /// Load configuration from a TOML file. A missing file yields the
    /// stock defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.is_empty() {
            return Err(ConfigError::Validation("catalog must not be empty".into()));
        }
        if self.media_root.is_empty() {
            return Err(ConfigError::Validation(
                "media_root must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ToolConfig::load(&tmp.path().join("rendition.toml")).unwrap();
        assert_eq!(config, ToolConfig::default());
        assert_eq!(config.catalog, "catalog.json");
        assert_eq!(config.media_root, "media");
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn sparse_file_overrides_only_given_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rendition.toml");
        fs::write(&path, "base_url = \"/media\"\n").unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.catalog, "catalog.json");
        assert_eq!(config.base_url, Some("/media".into()));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rendition.toml");
        fs::write(&path, "media_dir = \"media\"\n").unwrap();

        assert!(matches!(
            ToolConfig::load(&path),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn empty_media_root_fails_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rendition.toml");
        fs::write(&path, "media_root = \"\"\n").unwrap();

        assert!(matches!(
            ToolConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rendition.toml");
        fs::write(&path, "catalog = [not toml").unwrap();

        assert!(matches!(ToolConfig::load(&path), Err(ConfigError::Toml(_))));
    }
}
