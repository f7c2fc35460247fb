//! `repotree.toml` in the workspace root.

use crate::config::paths;
use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use std::path::Path;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    let path = paths::workspace_config_path(workspace_root);
    builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
}
