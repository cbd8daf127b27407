//! The shared updater configuration document.
//!
//! A single YAML file holds the settings every plugin using the updater
//! honours: the feed API key and a global kill switch.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, UpdaterError};

/// Placeholder written into fresh config files; means "no API key".
pub const API_KEY_SENTINEL: &str = "PUT_API_KEY_HERE";

/// Comment block written above the defaults when the file is created.
const CONFIG_HEADER: &str = "\
# This configuration file affects all plugins using the updater.
# If you wish to use your API key, place it below.
# Some plugins may ignore the disable value; those can be turned off in
# the plugin's own configuration.
";

/// Settings read from the updater config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdaterConfig {
    /// API key sent as `X-API-Key`, or the sentinel.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Disable update checks for every plugin.
    #[serde(default)]
    pub disable: bool,
}

fn default_api_key() -> String {
    API_KEY_SENTINEL.to_string()
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            disable: false,
        }
    }
}

impl UpdaterConfig {
    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file doesn't exist.
    /// Returns `ConfigParseError` if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                UpdaterError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                UpdaterError::Io(e)
            }
        })?;

        Self::parse(&content, path)
    }

    /// Parse YAML content into a config.
    ///
    /// An empty document yields the defaults.
    pub fn parse(content: &str, source_path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| UpdaterError::ConfigParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the config, writing the defaults first if the file is missing.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        tracing::debug!("Created updater configuration at {}", path.display());
        Ok(config)
    }

    /// Write this config with the explanatory header.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = serde_yaml::to_string(self).map_err(|e| UpdaterError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        fs::write(path, format!("{}{}", CONFIG_HEADER, body))?;
        Ok(())
    }

    /// The configured API key; the sentinel and empty string mean none.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() || key.eq_ignore_ascii_case(API_KEY_SENTINEL) {
            None
        } else {
            Some(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_have_no_api_key_and_are_enabled() {
        let config = UpdaterConfig::default();
        assert_eq!(config.api_key(), None);
        assert!(!config.disable);
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config =
            UpdaterConfig::parse("api-key: abc123\ndisable: true\n", Path::new("c.yml")).unwrap();
        assert_eq!(config.api_key(), Some("abc123"));
        assert!(config.disable);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = UpdaterConfig::parse("disable: true\n", Path::new("c.yml")).unwrap();
        assert_eq!(config.api_key, API_KEY_SENTINEL);
        assert!(config.disable);
    }

    #[test]
    fn empty_document_is_default() {
        let config = UpdaterConfig::parse("  \n", Path::new("c.yml")).unwrap();
        assert_eq!(config, UpdaterConfig::default());
    }

    #[test]
    fn sentinel_is_case_insensitive() {
        let config = UpdaterConfig {
            api_key: "put_api_key_here".to_string(),
            disable: false,
        };
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let err = UpdaterConfig::parse("disable: [unclosed", Path::new("/cfg/config.yml"))
            .unwrap_err();
        assert!(matches!(err, UpdaterError::ConfigParseError { .. }));
        assert!(err.to_string().contains("/cfg/config.yml"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = UpdaterConfig::load(&temp.path().join("config.yml")).unwrap_err();
        assert!(matches!(err, UpdaterError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_or_create_writes_defaults_with_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Updater").join("config.yml");

        let config = UpdaterConfig::load_or_create(&path).unwrap();
        assert_eq!(config, UpdaterConfig::default());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# This configuration file"));
        assert!(written.contains("api-key: PUT_API_KEY_HERE"));
        assert!(written.contains("disable: false"));

        let reloaded = UpdaterConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn load_or_create_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "api-key: secret\ndisable: false\n").unwrap();

        let config = UpdaterConfig::load_or_create(&path).unwrap();
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "api-key: secret\ndisable: false\n");
    }
}
