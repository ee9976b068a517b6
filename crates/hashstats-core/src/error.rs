//! Error types for building and reporting over the hash index.

use derive_builder::UninitializedFieldError;
use thiserror::Error;

use crate::hash::ContentHash;

/// Errors that stop a report before any ranked output is produced.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Two buckets carry the same content hash.
    #[error("Corrupt index: duplicate bucket for hash {hash}")]
    CorruptIndex { hash: ContentHash },

    /// Invalid report configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ReportError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

impl From<String> for ReportError {
    fn from(message: String) -> Self {
        Self::InvalidConfig { message }
    }
}

impl From<UninitializedFieldError> for ReportError {
    fn from(err: UninitializedFieldError) -> Self {
        Self::invalid_config(err.to_string())
    }
}
