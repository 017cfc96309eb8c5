//! Bearer token types and management.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Access/refresh token pair issued by the marketplace API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token sent as `Authorization: Bearer`.
    pub access: String,
    /// Long-lived refresh token used to obtain a new access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    /// Expiration of the access token, when it can be read from the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        let access = access.into();
        Self {
            expires_at: jwt_expiry(&access),
            access,
            refresh: Some(refresh.into()),
        }
    }

    /// Creates a token pair from a token endpoint response.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        Self {
            expires_at: jwt_expiry(&response.access),
            access: response.access,
            refresh: response.refresh,
        }
    }

    /// Checks if the access token is expired (with 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Returns true if the pair can still produce a usable access token.
    #[must_use]
    pub fn is_renewable(&self) -> bool {
        !self.is_expired() || self.refresh.is_some()
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the refresh token if available.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is available.
    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh.as_deref().ok_or(Error::NoRefreshToken)
    }
}

/// Token response from the token endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access: String,
    /// Refresh token (absent when the server does not rotate it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Error response from the token endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    #[serde(default)]
    pub detail: String,
    /// Machine-readable code (e.g. `token_not_valid`).
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Converts to an Error.
    #[must_use]
    pub fn into_error(self, status: u16) -> Error {
        let detail = match self.code {
            Some(code) if self.detail.is_empty() => code,
            _ => self.detail,
        };
        Error::rejected(status, detail)
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without verifying it.
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}
