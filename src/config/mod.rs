//! Updater configuration.
//!
//! Two layers feed a pipeline run:
//! - The shared config document in [`store`], a YAML file holding the feed
//!   API key and the global `disable` switch
//! - Per-run [`options`] supplied by the host: project id, local version,
//!   directories, endpoint and timeouts
//!
//! # Example
//!
//! ```
//! use plugin_updater::config::UpdaterConfig;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("Updater").join("config.yml");
//!
//! let config = UpdaterConfig::load_or_create(&path).unwrap();
//! assert!(!config.disable);
//! assert_eq!(config.api_key(), None);
//! assert!(path.exists());
//! ```

pub mod options;
pub mod store;

pub use options::{
    UpdateOptions, UpdateType, DEFAULT_MAX_REDIRECTS, DEFAULT_METADATA_URL, DEFAULT_USER_AGENT,
};
pub use store::{UpdaterConfig, API_KEY_SENTINEL};
