//! Configuration System
//!
//! Layered configuration for the facade: logging, the process definitions
//! deployed into the engine at startup, the form registry contents and the
//! query window policy. See [`ConfigLoader`] for source precedence.

use crate::engine::ProcessModel;
use crate::form::FormDefinition;
use crate::logging::LoggingConfig;
use crate::query::QueryLimits;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::{ConfigLoader, ENV_PREFIX};
pub use merge::DEFAULT_SNAPSHOT_PATH;
pub use sources::workspace_file::ENV_NAME_VAR;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Form registry contents
    #[serde(default)]
    pub forms: Vec<FormDefinition>,

    #[serde(default)]
    pub query: QueryLimits,
}

/// Engine snapshot location and startup deployments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Relative paths resolve against the workspace root
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Deployed in order at startup; unchanged models are not redeployed
    #[serde(default)]
    pub definitions: Vec<ProcessModel>,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            definitions: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn snapshot_in(&self, workspace_root: &Path) -> PathBuf {
        if self.snapshot_path.is_absolute() {
            self.snapshot_path.clone()
        } else {
            workspace_root.join(&self.snapshot_path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Definition(String, String),
    Form(String, String),
    Query(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Definition(key, msg) => write!(f, "Definition '{}': {}", key, msg),
            ValidationError::Form(key, msg) => write!(f, "Form '{}': {}", key, msg),
            ValidationError::Query(msg) => write!(f, "Query: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FlowConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut definition_keys = HashSet::new();
        for definition in &self.engine.definitions {
            let key = &definition.key;
            if key.is_empty() || key.contains(':') {
                errors.push(ValidationError::Definition(
                    key.clone(),
                    "Key must be non-empty and must not contain ':'".to_string(),
                ));
            }
            if !definition_keys.insert(key.as_str()) {
                errors.push(ValidationError::Definition(
                    key.clone(),
                    "Duplicate definition key".to_string(),
                ));
            }
            let mut activity_ids = HashSet::new();
            for activity in &definition.activities {
                if activity.id.is_empty() {
                    errors.push(ValidationError::Definition(
                        key.clone(),
                        "Activity id cannot be empty".to_string(),
                    ));
                } else if !activity_ids.insert(activity.id.as_str()) {
                    errors.push(ValidationError::Definition(
                        key.clone(),
                        format!("Duplicate activity id '{}'", activity.id),
                    ));
                }
            }
        }

        let mut form_keys = HashSet::new();
        for form in &self.forms {
            if form.key.is_empty() {
                errors.push(ValidationError::Form(
                    form.key.clone(),
                    "Form key cannot be empty".to_string(),
                ));
            } else if !form_keys.insert(form.key.as_str()) {
                errors.push(ValidationError::Form(
                    form.key.clone(),
                    "Duplicate form key".to_string(),
                ));
            }
        }

        if self.query.default_limit == 0 || self.query.max_limit == 0 {
            errors.push(ValidationError::Query(
                "Limits must be greater than zero".to_string(),
            ));
        } else if self.query.default_limit > self.query.max_limit {
            errors.push(ValidationError::Query(format!(
                "default_limit {} exceeds max_limit {}",
                self.query.default_limit, self.query.max_limit
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
