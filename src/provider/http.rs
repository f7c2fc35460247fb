//! Directory-listing provider backed by the console's REST service.

use super::DirectoryProvider;
use crate::config::ProviderConfig;
use crate::error::ApiError;
use crate::tree::NodeDescriptor;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RootListing {
    #[serde(default)]
    repository_name: Option<String>,
    #[serde(default)]
    children: Vec<NodeDescriptor>,
}

#[derive(Debug, Deserialize)]
struct DirectoryListing {
    #[serde(default)]
    directory: Option<NodeDescriptor>,
    #[serde(default)]
    children: Vec<NodeDescriptor>,
}

/// Fetches listings over HTTP:
///
/// - `GET {api_url}/repository-tree/{repository}`
/// - `GET {api_url}/repository-tree/{repository}/directories/{node_id}`
#[derive(Debug, Clone)]
pub struct HttpDirectoryProvider {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpDirectoryProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_url).map_err(|e| {
            ApiError::ConfigError(format!("Invalid provider.api_url '{}': {}", config.api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::ConfigError(format!(
                "provider.api_url '{}' cannot be used as a base URL",
                config.api_url
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::ConfigError("provider.api_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T>(&self, url: Url, subject: &str) -> Result<T, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!(url = %url, "Requesting directory listing");
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        warn!(url = %url, status = status.as_u16(), "Directory listing request rejected");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ApiError::Unauthorized(format!("{} ({})", subject, status))
            }
            StatusCode::NOT_FOUND => ApiError::NodeNotFound(subject.to_string()),
            _ => ApiError::ProviderRequestFailed(format!("{} returned HTTP {}", subject, status)),
        })
    }
}

#[async_trait]
impl DirectoryProvider for HttpDirectoryProvider {
    async fn fetch_roots(&self, repository: &str) -> Result<Vec<NodeDescriptor>, ApiError> {
        let url = self.endpoint(&["repository-tree", repository])?;
        let listing: RootListing = self.get(url, repository).await?;
        if let Some(name) = listing.repository_name.as_deref().filter(|n| *n != repository) {
            debug!(requested = repository, served = name, "Repository served under another name");
        }
        Ok(listing.children)
    }

    async fn fetch_children(
        &self,
        repository: &str,
        node_id: &str,
    ) -> Result<Vec<NodeDescriptor>, ApiError> {
        if node_id.is_empty() {
            return Err(ApiError::InvalidNodeId("empty node id".to_string()));
        }
        let url = self.endpoint(&["repository-tree", repository, "directories", node_id])?;
        let listing: DirectoryListing = self.get(url, node_id).await?;
        if let Some(directory) = &listing.directory {
            debug!(
                directory = %directory.path,
                children = listing.children.len(),
                "Directory listing received"
            );
        }
        Ok(listing.children)
    }
}
