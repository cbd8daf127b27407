//! Error types for updater operations.
//!
//! This module defines [`UpdaterError`], the error type returned by every
//! pipeline stage, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Stage functions return `UpdaterError` so the pipeline can fold each
//!   failure into exactly one [`UpdateStatus`] via [`UpdaterError::status`]
//! - Use `anyhow::Error` (via `UpdaterError::Other`) for unexpected errors
//! - Errors never cross the worker boundary; callers only observe a status

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::UpdateStatus;

/// Core error type for updater operations.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// The metadata host rejected the configured API key.
    #[error("API key rejected by {url}")]
    ApiKeyRejected { url: String },

    /// The metadata host could not be reached or answered with an error.
    #[error("Could not reach {url}: {message}")]
    RemoteUnreachable { url: String, message: String },

    /// The metadata response was not a JSON array of release objects.
    #[error("Malformed metadata response: {message}")]
    MalformedFeed { message: String },

    /// The project id produced no usable metadata URL or no files.
    #[error("No files available for project id {id}: {message}")]
    BadProjectId { id: u32, message: String },

    /// The release display name carries no `vVERSION` token.
    #[error("No version token in release name '{name}'")]
    NoVersionToken { name: String },

    /// A URL in the feed or a `Location` header could not be parsed.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The redirect chain exceeded the configured hop limit.
    #[error("Too many redirects (limit {limit}) while resolving {url}")]
    TooManyRedirects { url: String, limit: usize },

    /// A 301/302 response arrived without a `Location` header.
    #[error("Redirect from {url} has no Location header")]
    MissingLocation { url: String },

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The artifact could not be downloaded to local storage.
    #[error("Download of {url} failed: {source}")]
    DownloadFailed {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The downloaded archive could not be extracted.
    #[error("Failed to extract {archive}: {message}")]
    ExtractFailed { archive: PathBuf, message: String },

    /// The working directory could not be merged into the installation root.
    #[error("Failed to merge {path}: {source}")]
    MergeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Updater configuration file not found at the given location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the updater configuration document.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UpdaterError {
    /// The terminal status a pipeline run records when a stage fails with this error.
    ///
    /// Extraction and merge failures fold into [`UpdateStatus::FailDownload`].
    pub fn status(&self) -> UpdateStatus {
        match self {
            UpdaterError::ApiKeyRejected { .. } => UpdateStatus::FailApiKey,
            UpdaterError::RemoteUnreachable { .. } | UpdaterError::MalformedFeed { .. } => {
                UpdateStatus::FailRemoteUnreachable
            }
            UpdaterError::BadProjectId { .. }
            | UpdaterError::ConfigNotFound { .. }
            | UpdaterError::ConfigParseError { .. } => UpdateStatus::FailBadId,
            UpdaterError::NoVersionToken { .. } => UpdateStatus::FailNoVersionToken,
            UpdaterError::InvalidUrl { .. }
            | UpdaterError::TooManyRedirects { .. }
            | UpdaterError::MissingLocation { .. }
            | UpdaterError::Network(_)
            | UpdaterError::DownloadFailed { .. }
            | UpdaterError::ExtractFailed { .. }
            | UpdaterError::MergeFailed { .. }
            | UpdaterError::Io(_)
            | UpdaterError::Other(_) => UpdateStatus::FailDownload,
        }
    }
}

/// Result type alias for updater operations.
pub type Result<T> = std::result::Result<T, UpdaterError>;
