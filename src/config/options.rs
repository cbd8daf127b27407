//! Per-run options supplied by the host.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default metadata endpoint; the project id is appended as `?projectIds=<id>`.
pub const DEFAULT_METADATA_URL: &str = "https://api.curseforge.com/servermods/files";

/// User-Agent sent on every request.
pub const DEFAULT_USER_AGENT: &str = concat!("plugin-updater/", env!("CARGO_PKG_VERSION"));

/// Default cap on followed redirects.
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// How far a run is allowed to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateType {
    /// Check the version, then download and install.
    #[default]
    Default,
    /// Skip the version check and always download.
    NoVersionCheck,
    /// Check the version but stop with `UpdateAvailable` instead of downloading.
    NoDownload,
}

/// Everything one pipeline run needs to know about its host.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Project id on the release feed.
    pub project_id: u32,

    /// Version of the installed plugin.
    pub local_version: String,

    /// The installed artifact; its file name names plain (non-archive) downloads.
    pub artifact_file: PathBuf,

    /// Directory receiving downloads and extraction working directories.
    pub updates_dir: PathBuf,

    /// Directory holding the installed components.
    pub installation_root: PathBuf,

    /// Shared updater config document; `None` uses the defaults.
    pub config_path: Option<PathBuf>,

    /// Metadata endpoint without query string.
    pub metadata_url: String,

    /// User-Agent header value.
    pub user_agent: String,

    /// Version check / download mode.
    pub update_type: UpdateType,

    /// Log download progress and completion at info level.
    pub announce: bool,

    /// Plugin author, named in misconfiguration warnings.
    pub author: Option<String>,

    /// Connect timeout for the metadata request.
    pub metadata_connect_timeout: Duration,

    /// Connect timeout for redirect resolution and downloads.
    pub connect_timeout: Duration,

    /// Read timeout for every request.
    pub read_timeout: Duration,

    /// Maximum number of redirects followed before giving up.
    pub max_redirects: usize,
}

impl UpdateOptions {
    /// Create options with default endpoint, timeouts and mode.
    pub fn new(
        project_id: u32,
        local_version: impl Into<String>,
        artifact_file: impl Into<PathBuf>,
        updates_dir: impl Into<PathBuf>,
        installation_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_id,
            local_version: local_version.into(),
            artifact_file: artifact_file.into(),
            updates_dir: updates_dir.into(),
            installation_root: installation_root.into(),
            config_path: None,
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            update_type: UpdateType::Default,
            announce: false,
            author: None,
            metadata_connect_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Read the shared config document from this path.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use a different metadata endpoint.
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    /// Set the run mode.
    pub fn with_update_type(mut self, update_type: UpdateType) -> Self {
        self.update_type = update_type;
        self
    }

    /// Enable info-level progress messages.
    pub fn announce(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    /// Name the plugin author in feed warnings.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Change the redirect cap.
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// File name of the installed artifact, used for non-archive downloads.
    pub fn artifact_name(&self) -> String {
        file_name_of(&self.artifact_file)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> UpdateOptions {
        UpdateOptions::new(
            31043,
            "1.0",
            "/srv/plugins/MyPlugin.jar",
            "/srv/plugins/update",
            "/srv/plugins",
        )
    }

    #[test]
    fn new_uses_defaults() {
        let opts = options();
        assert_eq!(opts.metadata_url, DEFAULT_METADATA_URL);
        assert_eq!(opts.update_type, UpdateType::Default);
        assert_eq!(opts.max_redirects, 20);
        assert_eq!(opts.metadata_connect_timeout, Duration::from_secs(5));
        assert_eq!(opts.connect_timeout, Duration::from_secs(15));
        assert!(!opts.announce);
        assert!(opts.config_path.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let opts = options()
            .with_update_type(UpdateType::NoDownload)
            .with_metadata_url("http://localhost/query")
            .with_author("Gravity")
            .with_max_redirects(3)
            .announce(true);

        assert_eq!(opts.update_type, UpdateType::NoDownload);
        assert_eq!(opts.metadata_url, "http://localhost/query");
        assert_eq!(opts.author.as_deref(), Some("Gravity"));
        assert_eq!(opts.max_redirects, 3);
        assert!(opts.announce);
    }

    #[test]
    fn artifact_name_is_file_name() {
        assert_eq!(options().artifact_name(), "MyPlugin.jar");
    }

    #[test]
    fn user_agent_names_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("plugin-updater/"));
    }
}
