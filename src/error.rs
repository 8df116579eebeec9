//! Error types for the flowgate facade.

use thiserror::Error;

/// Envelope code for requests rejected before any engine access.
pub const ERROR_CODE_VALIDATION: &str = "VALIDATION_ERROR";

/// Envelope code for any failure surfacing from an external collaborator.
pub const ERROR_CODE_SYSTEM: &str = "SYSTEM_ERROR";

/// Errors raised by a process engine behind the boundary traits
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Process instance not found: {0}")]
    InstanceNotFound(String),

    #[error("No deployed process definition with key: {0}")]
    DefinitionNotFound(String),

    #[error("Task {task_id} is already completed")]
    TaskClosed { task_id: String },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Internal(String),
}

/// Facade-level errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }

    /// Stable envelope code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::Validation(_) => ERROR_CODE_VALIDATION,
            FlowError::Engine(_) | FlowError::Config(_) => ERROR_CODE_SYSTEM,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }
}

impl From<config::ConfigError> for FlowError {
    fn from(err: config::ConfigError) -> Self {
        FlowError::Config(err.to_string())
    }
}
