//! Release metadata retrieval.
//!
//! The feed answers `GET <endpoint>?projectIds=<id>` with a JSON array of
//! release objects ordered oldest to newest. Only the last one matters.

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::UpdateOptions;
use crate::error::{Result, UpdaterError};

/// Release channel of a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Alpha,
    Beta,
    Release,
}

impl ReleaseType {
    /// Parse a feed value, ignoring case. Unknown values yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "alpha" => Some(Self::Alpha),
            "beta" => Some(Self::Beta),
            "release" => Some(Self::Release),
            _ => None,
        }
    }
}

/// The most recent release advertised by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateMetadata {
    /// Display name with the embedded version token.
    pub display_name: String,
    /// Direct or redirecting link to the artifact.
    pub download_url: Option<String>,
    /// Release channel.
    pub release_type: Option<ReleaseType>,
    /// Target platform version, opaque.
    pub game_version: Option<String>,
}

/// Raw feed entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseEntry {
    name: Option<String>,
    download_url: Option<String>,
    release_type: Option<String>,
    game_version: Option<String>,
}

impl From<ReleaseEntry> for UpdateMetadata {
    fn from(entry: ReleaseEntry) -> Self {
        Self {
            display_name: entry.name.unwrap_or_default(),
            download_url: entry.download_url,
            release_type: entry.release_type.as_deref().and_then(ReleaseType::from_name),
            game_version: entry.game_version,
        }
    }
}

/// Parse a feed response body and keep its newest entry.
///
/// # Errors
///
/// Returns `MalformedFeed` if the body is not an array of objects and
/// `BadProjectId` if the array is empty.
pub fn parse_feed(body: &str, project_id: u32) -> Result<UpdateMetadata> {
    let entries: Vec<ReleaseEntry> =
        serde_json::from_str(body).map_err(|e| UpdaterError::MalformedFeed {
            message: e.to_string(),
        })?;

    entries
        .into_iter()
        .last()
        .map(UpdateMetadata::from)
        .ok_or_else(|| UpdaterError::BadProjectId {
            id: project_id,
            message: "the feed returned no files".to_string(),
        })
}

/// Queries the release feed for one project.
pub struct MetadataClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl MetadataClient {
    /// Create a client for the configured endpoint.
    pub fn new(options: &UpdateOptions, api_key: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .connect_timeout(options.metadata_connect_timeout)
            .timeout(options.read_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: options.metadata_url.clone(),
            api_key: api_key.map(String::from),
        })
    }

    /// Build the query URL for a project.
    ///
    /// # Errors
    ///
    /// Returns `BadProjectId` if the endpoint and id do not form a valid URL.
    pub fn query_url(&self, project_id: u32) -> Result<Url> {
        Url::parse_with_params(&self.endpoint, &[("projectIds", project_id.to_string())]).map_err(
            |e| UpdaterError::BadProjectId {
                id: project_id,
                message: format!("invalid query URL {}: {}", self.endpoint, e),
            },
        )
    }

    /// Fetch and parse the newest release for a project.
    ///
    /// # Errors
    ///
    /// Returns `ApiKeyRejected` on HTTP 403, `RemoteUnreachable` for other
    /// transport or HTTP failures, and the [`parse_feed`] errors.
    pub fn fetch_latest(&self, project_id: u32) -> Result<UpdateMetadata> {
        let url = self.query_url(project_id)?;
        debug!("Querying release feed at {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request.send().map_err(|e| UpdaterError::RemoteUnreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if response.status() == StatusCode::FORBIDDEN {
            return Err(UpdaterError::ApiKeyRejected {
                url: url.to_string(),
            });
        }

        if !response.status().is_success() {
            return Err(UpdaterError::RemoteUnreachable {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body = response.text().map_err(|e| UpdaterError::RemoteUnreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        parse_feed(&body, project_id)
    }
}
