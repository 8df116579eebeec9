//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::envelope::Envelope;
use crate::error::FlowError;
use thiserror::Error;

/// A failed command, carrying the envelope code and message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CommandFailure {
    pub code: String,
    pub message: String,
}

impl From<FlowError> for CommandFailure {
    fn from(err: FlowError) -> Self {
        CommandFailure {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Payload of a successful envelope; a failed one becomes a [`CommandFailure`].
pub fn into_payload<T>(envelope: Envelope<T>) -> Result<Option<T>, CommandFailure> {
    envelope
        .into_result()
        .map_err(|(code, message)| CommandFailure { code, message })
}

/// Map command failures to a string for CLI output.
pub fn map_error(e: &CommandFailure) -> String {
    e.to_string()
}
