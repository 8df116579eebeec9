//! Layered loading of [`FlowConfig`].

use super::merge;
use super::sources::{global_file, workspace_file};
use super::FlowConfig;
use crate::error::FlowError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment overrides, e.g. `FLOWGATE__QUERY__MAX_LIMIT=100`.
pub const ENV_PREFIX: &str = "FLOWGATE";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<FlowConfig, FlowError> {
        let builder = merge::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder.add_source(environment()).build()?;
        let loaded: FlowConfig = config.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            definitions = loaded.engine.definitions.len(),
            forms = loaded.forms.len(),
            "Loaded configuration"
        );
        Ok(loaded)
    }

    /// Defaults overlaid with a single file; no global, workspace or environment layers.
    pub fn load_from_file(path: &Path) -> Result<FlowConfig, FlowError> {
        let config = merge::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Location of the user-level config file, if one can be derived.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

