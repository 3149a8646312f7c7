use thiserror::Error;

use crate::workflow::types::AggregateFailure;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Unexpected reply from {endpoint} (HTTP {status}): {message}")]
    Decode {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Malformed payload from {endpoint}: {message}")]
    Payload { endpoint: String, message: String },

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("{0}")]
    Workflow(AggregateFailure),
}

impl AppError {
    /// True for failures of the request/reply exchange itself, as opposed to
    /// the remote service rejecting the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport { .. } | AppError::Decode { .. })
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
