//! MergeService: orchestrates sources and deserializes to RepoTreeConfig.

use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::RepoTreeConfig;
use config::{Config, ConfigError, File, FileFormat};
use std::path::Path;
use tracing::debug;

pub struct MergeService;

impl MergeService {
    /// Precedence: global file, workspace file, environment. Keys no layer
    /// sets fall back to the serde defaults of `RepoTreeConfig`.
    pub fn load(workspace_root: &Path) -> Result<RepoTreeConfig, ConfigError> {
        let builder = Config::builder();
        let builder = global_file::add_to_builder(builder);
        let builder = workspace_file::add_to_builder(builder, workspace_root);
        let builder = environment::add_to_builder(builder);

        let config: RepoTreeConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            provider = ?config.provider.kind,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load one explicit file with the environment overlay; the global and
    /// workspace files are not consulted.
    pub fn load_from_file(path: &Path) -> Result<RepoTreeConfig, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }
}
