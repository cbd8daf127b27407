//! Plugin Updater - background update pipeline for installed plugins.
//!
//! Checks a release feed for a newer build of an installed plugin, downloads
//! it, and when the release is a `.zip` unpacks it and merges the contents
//! into the installation tree without disturbing files that are already
//! there.
//!
//! # Modules
//!
//! - [`archive`] - Archive extraction and entry classification
//! - [`config`] - Shared updater config document and per-run options
//! - [`download`] - Chunked artifact download with progress
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Release feed client and redirect resolution
//! - [`install`] - Merging extracted files into the installation root
//! - [`logging`] - Tracing subscriber setup
//! - [`pipeline`] - Background runs, statuses and completion callbacks
//! - [`version`] - Version token extraction and update decisions
//!
//! # Example
//!
//! ```
//! use plugin_updater::config::UpdateType;
//! use plugin_updater::version::{decide, extract_version_token, VersionDecision};
//!
//! assert_eq!(extract_version_token("MyPlugin v1.4.2").unwrap(), "1.4.2");
//!
//! let decision = decide(UpdateType::Default, "1.4.2-rc", "MyPlugin v1.4.2-RC").unwrap();
//! assert_eq!(decision, VersionDecision::NoUpdate);
//! ```
//!
//! For full runs against a feed, see the integration tests.

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod install;
pub mod logging;
pub mod pipeline;
pub mod version;

pub use error::{Result, UpdaterError};
pub use pipeline::{UpdateHandle, UpdatePipeline, UpdateReport, UpdateStatus};
