//! ConfigLoader facade delegating to the merge service.

use super::merge::MergeService;
use super::RepoTreeConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the standard files and the environment.
    pub fn load(workspace_root: &Path) -> Result<RepoTreeConfig, ApiError> {
        let config = MergeService::load(workspace_root)?;
        config.validate().map_err(ApiError::ConfigError)?;
        Ok(config)
    }

    /// Load configuration from a specific file plus the environment.
    pub fn load_from_file(path: &Path) -> Result<RepoTreeConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate().map_err(ApiError::ConfigError)?;
        Ok(config)
    }
}
