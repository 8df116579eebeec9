//! Uniform result envelope for every public operation.

use crate::error::FlowError;
use serde::{Deserialize, Serialize};

/// Success payload (with optional total) or error code plus message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self::success_opt(Some(data))
    }

    /// Success that may carry no payload (e.g. a lookup that found nothing).
    pub fn success_opt(data: Option<T>) -> Self {
        Envelope {
            success: true,
            data,
            total: None,
            code: None,
            message: None,
        }
    }

    pub fn with_total(mut self, total: Option<u64>) -> Self {
        self.total = total;
        self
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            total: None,
            code: Some(code.into()),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Convert back into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<Option<T>, (String, String)> {
        if self.success {
            Ok(self.data)
        } else {
            Err((
                self.code.unwrap_or_default(),
                self.message.unwrap_or_default(),
            ))
        }
    }
}

impl<T> From<FlowError> for Envelope<T> {
    fn from(err: FlowError) -> Self {
        Envelope::error(err.code(), err.to_string())
    }
}
