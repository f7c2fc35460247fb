//! Error types shared across the tree store, providers, configuration and CLI.

use thiserror::Error;

/// Errors surfaced by repotree operations.
///
/// Stale or unidentified node references are not errors; the store treats them
/// as no-ops and reports them through `ToggleOutcome::Ignored`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::ProviderError(format!("Malformed listing response: {}", err))
        } else {
            ApiError::ProviderRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ProviderError(format!("Malformed tree document: {}", err))
    }
}
