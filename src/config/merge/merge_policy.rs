//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

pub const DEFAULT_SNAPSHOT_PATH: &str = ".flowgate/engine.json";

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace scalars and whole arrays; tables merge key by key.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("engine.snapshot_path", DEFAULT_SNAPSHOT_PATH)?
        .set_default("query.default_limit", 20_i64)?
        .set_default("query.max_limit", 500_i64)
}
