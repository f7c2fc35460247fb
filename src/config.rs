//! Configuration
//!
//! Layered configuration loaded with the `config` crate. Precedence, lowest
//! first: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/repotree/config.toml`), the workspace file
//! (`repotree.toml`), then `REPOTREE__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::tree::CollapseGuard;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_REPOSITORY: &str = "nsdk-sources";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoTreeConfig {
    pub repository: RepositoryConfig,
    pub provider: ProviderConfig,
    pub tree: TreeConfig,
    pub logging: LoggingConfig,
}

impl RepoTreeConfig {
    /// Reject combinations that cannot produce a working provider.
    pub fn validate(&self) -> Result<(), String> {
        if self.repository.name.trim().is_empty() {
            return Err("repository.name must not be empty".to_string());
        }
        if self.provider.timeout_ms == 0 {
            return Err("provider.timeout_ms must be greater than zero".to_string());
        }
        match self.provider.kind {
            ProviderKind::Http if self.provider.api_url.trim().is_empty() => {
                Err("provider.api_url is required for the http provider".to_string())
            }
            ProviderKind::Local if self.provider.root.is_none() => {
                Err("provider.root is required for the local provider".to_string())
            }
            ProviderKind::Snapshot if self.provider.snapshot.is_none() => {
                Err("provider.snapshot is required for the snapshot provider".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub name: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_REPOSITORY.to_string(),
        }
    }
}

/// Which backend serves directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Http,
    Local,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_url: String,
    /// Bearer token for the listing service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub timeout_ms: u64,
    /// Checkout directory for the local provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Tree document for the snapshot provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    pub show_hidden: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_ms: 10_000,
            root: None,
            snapshot: None,
            show_hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub collapse_guard: CollapseGuard,
    /// Depth expanded by `repotree tree` when `--depth` is not given.
    pub default_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            collapse_guard: CollapseGuard::Global,
            default_depth: 1,
        }
    }
}
