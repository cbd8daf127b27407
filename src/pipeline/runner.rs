//! The worker side of a run.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::status::{Stage, UpdateStatus};
use crate::archive::{is_archive, ArchiveExpander};
use crate::config::{UpdateOptions, UpdateType};
use crate::download::ArtifactDownloader;
use crate::error::{Result, UpdaterError};
use crate::fetch::{MetadataClient, RedirectingFetcher, UpdateMetadata};
use crate::install::InstallMerger;
use crate::version::{decide, VersionDecision};

/// State of one run on its worker thread.
pub(crate) struct Run {
    options: UpdateOptions,
    client: MetadataClient,
    stage: Stage,
    metadata: Option<UpdateMetadata>,
}

impl Run {
    pub(crate) fn new(options: UpdateOptions, client: MetadataClient) -> Self {
        Self {
            options,
            client,
            stage: Stage::Idle,
            metadata: None,
        }
    }

    /// Drive the run to its terminal status.
    pub(crate) fn execute(mut self) -> (UpdateStatus, Option<UpdateMetadata>) {
        let status = match self.stages() {
            Ok(status) => status,
            Err(e) => {
                self.report_failure(&e);
                e.status()
            }
        };

        self.enter(Stage::Done);
        debug!("Update run for project {} ended: {}", self.options.project_id, status);
        (status, self.metadata)
    }

    fn stages(&mut self) -> Result<UpdateStatus> {
        self.enter(Stage::Fetching);
        let metadata = self.client.fetch_latest(self.options.project_id)?;
        let display_name = metadata.display_name.clone();
        let link = metadata.download_url.clone();
        self.metadata = Some(metadata);

        self.enter(Stage::Deciding);
        let decision = decide(
            self.options.update_type,
            &self.options.local_version,
            &display_name,
        )?;
        if decision == VersionDecision::NoUpdate {
            return Ok(UpdateStatus::NoUpdate);
        }

        let Some(link) = link else {
            debug!("Release '{}' has no download link", display_name);
            return Ok(UpdateStatus::UpdateAvailable);
        };
        if self.options.update_type == UpdateType::NoDownload {
            return Ok(UpdateStatus::UpdateAvailable);
        }

        self.enter(Stage::Downloading);
        purge_stale_archives(&self.options.updates_dir);

        let file_name = download_file_name(&link, &self.options.artifact_name());
        let destination = self.options.updates_dir.join(&file_name);
        if self.options.announce {
            info!("About to download a new update: {}", display_name);
        }

        let fetcher = RedirectingFetcher::from_options(&self.options)?;
        ArtifactDownloader::new(fetcher, self.options.announce).download(&link, &destination)?;

        if is_archive(&file_name) {
            self.install_archive(&destination)?;
        }

        if self.options.announce {
            info!("Finished updating.");
        }
        Ok(UpdateStatus::Success)
    }

    fn install_archive(&mut self, archive: &Path) -> Result<()> {
        let root = self.options.installation_root.clone();

        self.enter(Stage::Expanding);
        let expansion = ArchiveExpander::new(&root).expand(archive)?;
        debug!(
            "{} of {} extracted entries belong to installed components ({} packaged units)",
            expansion
                .entries
                .iter()
                .filter(|e| e.belongs_to_installed_component)
                .count(),
            expansion.entries.len(),
            expansion.packaged_units().count()
        );

        self.enter(Stage::Merging);
        let report = InstallMerger::new().merge(&expansion, &root)?;
        debug!(
            "Merge adopted {}, replaced {}, discarded {}, dropped {} ({} failures)",
            report.adopted.len(),
            report.replaced.len(),
            report.discarded.len(),
            report.dropped.len(),
            report.failures
        );
        Ok(())
    }

    fn enter(&mut self, next: Stage) {
        debug!("Update stage: {} -> {}", self.stage, next);
        self.stage = next;
    }

    fn report_failure(&self, err: &UpdaterError) {
        match err {
            UpdaterError::ApiKeyRejected { .. } => {
                warn!("The API key you have provided is incorrect!");
                warn!("Please double-check your configuration to ensure it is correct.");
            }
            UpdaterError::RemoteUnreachable { .. } | UpdaterError::MalformedFeed { .. } => {
                warn!("The updater could not contact the release feed for updating.");
                warn!(
                    "If you have not recently modified your configuration and this is the \
                     first time you are seeing this message, the site may be experiencing \
                     temporary downtime."
                );
            }
            UpdaterError::BadProjectId { id, .. } => {
                warn!("The project id provided for updating, {}, is invalid.", id);
            }
            UpdaterError::NoVersionToken { name } => {
                let author = self.options.author.as_deref().unwrap_or("unknown");
                warn!(
                    "The author of this plugin ({}) has misconfigured their auto update system",
                    author
                );
                warn!(
                    "File versions should follow the format 'PluginName vVERSION'; found '{}'",
                    name
                );
                warn!("Please notify the author of this error.");
            }
            _ => {}
        }
        error!("Update stage {} failed: {}", self.stage, err);
    }
}

/// Name for the downloaded file: the link's last segment for archives,
/// otherwise the installed artifact's name.
pub(crate) fn download_file_name(link: &str, artifact_name: &str) -> String {
    if is_archive(link) {
        if let Some(segment) = link.rsplit('/').next().filter(|s| !s.is_empty()) {
            return segment.to_string();
        }
    }
    artifact_name.to_string()
}

/// Remove archives left over from an earlier interrupted run.
fn purge_stale_archives(updates_dir: &Path) {
    let Ok(entries) = fs::read_dir(updates_dir) else {
        return;
    };

    let stale: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| is_archive(&name.to_string_lossy()))
        })
        .collect();

    for path in stale {
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed stale archive {}", path.display()),
            Err(e) => warn!(
                "The updater could not delete file at: {} ({})",
                path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn archive_link_keeps_its_own_name() {
        assert_eq!(
            download_file_name("https://files.example.com/42/Bundle.zip", "MyPlugin.jar"),
            "Bundle.zip"
        );
    }

    #[test]
    fn other_links_use_artifact_name() {
        assert_eq!(
            download_file_name("https://files.example.com/42/download", "MyPlugin.jar"),
            "MyPlugin.jar"
        );
        assert_eq!(
            download_file_name("https://files.example.com/42/v2.jar", "MyPlugin.jar"),
            "MyPlugin.jar"
        );
    }

    #[test]
    fn purge_removes_only_archives() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.zip"), "z").unwrap();
        fs::write(temp.path().join("MyPlugin.jar"), "j").unwrap();
        fs::create_dir(temp.path().join("pending.zip")).unwrap();

        purge_stale_archives(temp.path());

        assert!(!temp.path().join("old.zip").exists());
        assert!(temp.path().join("MyPlugin.jar").exists());
        assert!(temp.path().join("pending.zip").is_dir());
    }

    #[test]
    fn purge_tolerates_missing_dir() {
        let temp = TempDir::new().unwrap();
        purge_stale_archives(&temp.path().join("absent"));
    }
}
