//! Temporary key errors

use thiserror::Error;

use crate::domain::DomainError;

/// Errors surfaced to callers of the temp key issuer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TempKeyError {
    #[error("Invalid temporary key request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to generate temporary key: {reason}")]
    GenerationFailed { reason: String },

    /// A single-use handle was invoked a second time
    #[error("Temporary key already used")]
    AlreadyUsed,
}

impl TempKeyError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn generation_failed(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            reason: reason.into(),
        }
    }
}

/// Error reported by a key manager; carries the message verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct KeyManagerError {
    message: String,
}

impl KeyManagerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DomainError> for KeyManagerError {
    fn from(error: DomainError) -> Self {
        Self::new(error.to_string())
    }
}
