//! Error types for the core library.

use marketledger_api::ApiError;
use thiserror::Error;

use crate::listing::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Listing draft failed validation.
    #[error("Invalid listing: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Message content was blank.
    #[error("Message is empty")]
    EmptyMessage,

    /// String does not name a cache key.
    #[error("Unknown cache key: {0}")]
    UnknownCacheKey(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Returns the API error, if this is one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
