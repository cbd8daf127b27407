//! Caller-side view of a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, OnceLock};
use std::thread::JoinHandle;
use tracing::error;

use super::status::UpdateStatus;
use crate::fetch::{ReleaseType, UpdateMetadata};

/// Final result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    /// Terminal status.
    pub status: UpdateStatus,
    /// Newest release seen on the feed, if the fetch got that far.
    pub metadata: Option<UpdateMetadata>,
    /// When the run finished.
    pub checked_at: DateTime<Utc>,
}

impl UpdateReport {
    /// A report stamped with the current time.
    pub fn new(status: UpdateStatus, metadata: Option<UpdateMetadata>) -> Self {
        Self {
            status,
            metadata,
            checked_at: Utc::now(),
        }
    }
}

/// Handle to a run started by [`UpdatePipeline::start`](super::UpdatePipeline::start).
///
/// Every accessor blocks until the worker has finished, then reads the
/// same write-once report.
pub struct UpdateHandle {
    worker: Mutex<Option<JoinHandle<UpdateReport>>>,
    report: OnceLock<UpdateReport>,
}

impl UpdateHandle {
    pub(crate) fn spawned(worker: JoinHandle<UpdateReport>) -> Self {
        Self {
            worker: Mutex::new(Some(worker)),
            report: OnceLock::new(),
        }
    }

    pub(crate) fn finished(report: UpdateReport) -> Self {
        Self {
            worker: Mutex::new(None),
            report: OnceLock::from(report),
        }
    }

    /// Whether the report is available without waiting.
    pub fn is_finished(&self) -> bool {
        if self.report.get().is_some() {
            return true;
        }
        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        worker.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Wait for the run and return its report.
    pub fn report(&self) -> &UpdateReport {
        self.report.get_or_init(|| self.join_worker())
    }

    /// Wait for the run and return its status.
    pub fn status(&self) -> UpdateStatus {
        self.report().status
    }

    /// Display name of the newest release.
    pub fn latest_name(&self) -> Option<&str> {
        self.metadata().map(|m| m.display_name.as_str())
    }

    /// Download link of the newest release.
    pub fn latest_file_link(&self) -> Option<&str> {
        self.metadata().and_then(|m| m.download_url.as_deref())
    }

    /// Release channel of the newest release.
    pub fn latest_type(&self) -> Option<ReleaseType> {
        self.metadata().and_then(|m| m.release_type)
    }

    /// Target platform version of the newest release.
    pub fn latest_game_version(&self) -> Option<&str> {
        self.metadata().and_then(|m| m.game_version.as_deref())
    }

    fn metadata(&self) -> Option<&UpdateMetadata> {
        self.report().metadata.as_ref()
    }

    fn join_worker(&self) -> UpdateReport {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        match handle.map(JoinHandle::join) {
            Some(Ok(report)) => report,
            Some(Err(_)) => {
                error!("The updater worker panicked");
                UpdateReport::new(UpdateStatus::FailDownload, None)
            }
            None => UpdateReport::new(UpdateStatus::FailDownload, None),
        }
    }
}
