//! Release version extraction and update decisions.
//!
//! Release feeds publish display names such as `"MyPlugin v1.4.2"`. The
//! version token is the text after a `v` marker that starts the name or
//! follows whitespace, `_` or `-`.
//!
//! The comparison is a case-insensitive string inequality, not a semantic
//! version ordering: any textual difference, including a lower remote
//! version, means "update".

use regex::Regex;
use std::sync::LazyLock;

use crate::config::UpdateType;
use crate::error::{Result, UpdaterError};

/// Marker that introduces the version token in a display name.
static VERSION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v|[\s_-]v").expect("VERSION_MARKER must compile"));

/// Local version tags that never trigger an update.
pub const NO_UPDATE_TAGS: [&str; 3] = ["-DEV", "-PRE", "-SNAPSHOT"];

/// Outcome of the version decision stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionDecision {
    /// Continue to the download stage.
    Proceed {
        /// Remote token, `None` when version checking was skipped.
        remote: Option<String>,
    },
    /// Local installation is current (or suppressed).
    NoUpdate,
}

/// Extract the version token from a release display name.
///
/// The name is split on every marker and the last non-empty segment wins;
/// the token runs up to the next whitespace.
///
/// # Errors
///
/// Returns `NoVersionToken` if the name has no marker or the token is empty.
pub fn extract_version_token(display_name: &str) -> Result<String> {
    let mut segments: Vec<&str> = VERSION_MARKER.split(display_name).collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    let no_token = || UpdaterError::NoVersionToken {
        name: display_name.to_string(),
    };

    if segments.len() < 2 {
        return Err(no_token());
    }

    let token = segments
        .last()
        .and_then(|s| s.split(char::is_whitespace).next())
        .unwrap_or_default();

    if token.is_empty() {
        return Err(no_token());
    }

    Ok(token.to_string())
}

/// Check whether the local version carries a pre-release tag.
pub fn is_suppressed(local_version: &str) -> bool {
    let upper = local_version.to_uppercase();
    NO_UPDATE_TAGS.iter().any(|tag| upper.contains(tag))
}

/// Check whether the remote token differs from the local version.
pub fn should_update(local_version: &str, remote_version: &str) -> bool {
    local_version.to_lowercase() != remote_version.to_lowercase()
}

/// Run the version policy for one pipeline run.
pub fn decide(
    update_type: UpdateType,
    local_version: &str,
    display_name: &str,
) -> Result<VersionDecision> {
    if update_type == UpdateType::NoVersionCheck {
        return Ok(VersionDecision::Proceed { remote: None });
    }

    let remote = extract_version_token(display_name)?;

    if is_suppressed(local_version) || !should_update(local_version, &remote) {
        return Ok(VersionDecision::NoUpdate);
    }

    Ok(VersionDecision::Proceed {
        remote: Some(remote),
    })
}
