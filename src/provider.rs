//! Directory-listing providers
//!
//! The tree store never talks to a backend directly. It asks a
//! [`DirectoryProvider`] for the immediate children of one node at a time.

pub mod http;
pub mod local;
pub mod snapshot;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ApiError;
use crate::tree::NodeDescriptor;
use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpDirectoryProvider;
pub use local::LocalDirectoryProvider;
pub use snapshot::SnapshotDirectoryProvider;

/// Source of one-level directory listings.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Entries at the top of `repository`.
    async fn fetch_roots(&self, repository: &str) -> Result<Vec<NodeDescriptor>, ApiError>;

    /// Immediate children of the directory identified by `node_id`.
    async fn fetch_children(
        &self,
        repository: &str,
        node_id: &str,
    ) -> Result<Vec<NodeDescriptor>, ApiError>;
}

/// Build the provider selected by configuration.
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn DirectoryProvider>, ApiError> {
    match config.kind {
        ProviderKind::Http => Ok(Arc::new(HttpDirectoryProvider::new(config)?)),
        ProviderKind::Local => {
            let root = config.root.clone().ok_or_else(|| {
                ApiError::ProviderNotConfigured(
                    "provider.root is required for the local provider".to_string(),
                )
            })?;
            Ok(Arc::new(
                LocalDirectoryProvider::new(root)?.with_hidden(config.show_hidden),
            ))
        }
        ProviderKind::Snapshot => {
            let path = config.snapshot.as_ref().ok_or_else(|| {
                ApiError::ProviderNotConfigured(
                    "provider.snapshot is required for the snapshot provider".to_string(),
                )
            })?;
            Ok(Arc::new(SnapshotDirectoryProvider::from_path(path)?))
        }
    }
}
