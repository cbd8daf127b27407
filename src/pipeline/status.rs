//! Terminal statuses and run stages.

use serde::Serialize;
use std::fmt;

/// Terminal outcome of one update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// A newer artifact was downloaded and installed.
    Success,
    /// The installed version is current or updates are suppressed for it.
    NoUpdate,
    /// Updates are turned off in the shared configuration.
    Disabled,
    /// A newer version exists but the run was not allowed to download it.
    UpdateAvailable,
    /// Download, extraction or merge failed.
    FailDownload,
    /// The release feed could not be reached or read.
    FailRemoteUnreachable,
    /// The newest release name has no version token.
    FailNoVersionToken,
    /// The project id is unknown to the feed.
    FailBadId,
    /// The feed rejected the configured API key.
    FailApiKey,
}

impl UpdateStatus {
    /// Whether the run ended in one of the failure statuses.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::FailDownload
                | Self::FailRemoteUnreachable
                | Self::FailNoVersionToken
                | Self::FailBadId
                | Self::FailApiKey
        )
    }

    /// Whether the run installed something.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::NoUpdate => "no update",
            Self::Disabled => "disabled",
            Self::UpdateAvailable => "update available",
            Self::FailDownload => "download failed",
            Self::FailRemoteUnreachable => "release feed unreachable",
            Self::FailNoVersionToken => "no version token",
            Self::FailBadId => "bad project id",
            Self::FailApiKey => "API key rejected",
        };
        f.write_str(label)
    }
}

/// Where a run currently is. Only used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Deciding,
    Downloading,
    Expanding,
    Merging,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Deciding => "deciding",
            Self::Downloading => "downloading",
            Self::Expanding => "expanding",
            Self::Merging => "merging",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}
