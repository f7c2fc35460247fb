//! Per-user configuration file.

use crate::config::paths;
use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match paths::global_config_path() {
        Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml).required(false)),
        None => builder,
    }
}
