//! Environment variable source: REPOTREE__SECTION__KEY

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const PREFIX: &str = "REPOTREE";

/// Overlay `REPOTREE__<SECTION>__<KEY>` variables, e.g.
/// `REPOTREE__PROVIDER__API_URL`.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
