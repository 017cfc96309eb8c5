//! Error types for session and token operations.

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Session and token error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token endpoint refused the request.
    #[error("Token request rejected ({status}): {detail}")]
    Rejected {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Human-readable reason from the server.
        detail: String,
    },

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// There is no signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Failed to access the platform keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Creates a rejection error from a status code and server detail.
    #[must_use]
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            detail: detail.into(),
        }
    }
}
