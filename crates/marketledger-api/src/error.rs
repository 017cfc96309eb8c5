//! Error taxonomy for API requests.

use std::fmt;

use serde_json::Value;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received (connection refused, DNS, timeout).
    NetworkUnavailable,
    /// 400 Bad Request.
    BadRequest,
    /// 401 after the single refresh-and-replay attempt.
    Unauthorized,
    /// 403 Forbidden.
    Forbidden,
    /// 404 Not Found.
    NotFound,
    /// 500 Internal Server Error.
    ServerError,
    /// The token refresh failed; the session was cleared.
    SessionExpired,
    /// Any other status, or a response that could not be decoded.
    Unknown,
}

impl ErrorKind {
    /// Maps an HTTP status to its error class.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Fallback message when the server gave none.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::NetworkUnavailable => "Unable to reach the server. Check your connection.",
            Self::BadRequest => "The request was invalid.",
            Self::Unauthorized => "You need to sign in to do that.",
            Self::Forbidden => "You do not have permission to do that.",
            Self::NotFound => "The requested item could not be found.",
            Self::ServerError => "The server encountered an error. Please try again later.",
            Self::SessionExpired => "Your session has expired. Please sign in again.",
            Self::Unknown => "An unexpected error occurred.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NetworkUnavailable => "network unavailable",
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::ServerError => "server error",
            Self::SessionExpired => "session expired",
            Self::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

/// Error view the routing layer should navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Sign-in screen.
    Login,
    /// "Access denied" view.
    Forbidden,
    /// "Not found" view.
    NotFound,
    /// "Something went wrong" view.
    ServerError,
}

/// A classified request failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Error class.
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// Creates an error.
    #[must_use]
    pub fn new(kind: ErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Creates an error for a request that never got a response.
    #[must_use]
    pub fn network(detail: impl fmt::Display) -> Self {
        tracing::debug!("Network failure: {detail}");
        Self::new(
            ErrorKind::NetworkUnavailable,
            None,
            ErrorKind::NetworkUnavailable.default_message(),
        )
    }

    /// Creates the error returned when the session could not be refreshed.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::new(
            ErrorKind::SessionExpired,
            Some(401),
            ErrorKind::SessionExpired.default_message(),
        )
    }

    /// Creates an error for a response body that could not be decoded.
    #[must_use]
    pub fn decode(status: u16, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Unknown,
            Some(status),
            format!("Unexpected response from server: {detail}"),
        )
    }

    /// Classifies an error response, extracting the server's message.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let kind = ErrorKind::from_status(status);
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| extract_message(&value))
            .unwrap_or_else(|| kind.default_message().to_string());
        Self::new(kind, Some(status), message)
    }

    /// Returns the view a navigation-worthy error should redirect to.
    #[must_use]
    pub const fn redirect(&self) -> Option<Redirect> {
        match self.kind {
            ErrorKind::Unauthorized | ErrorKind::SessionExpired => Some(Redirect::Login),
            ErrorKind::Forbidden => Some(Redirect::Forbidden),
            ErrorKind::NotFound => Some(Redirect::NotFound),
            ErrorKind::ServerError => Some(Redirect::ServerError),
            _ => None,
        }
    }
}

/// Pulls a readable message out of a JSON error body.
///
/// Understands `{"detail": ..}`, `{"error": ..}`, `{"message": ..}` and
/// field-error maps like `{"title": ["This field is required."]}`.
fn extract_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(extract_message),
        Value::Object(map) => {
            for key in ["detail", "error", "message", "non_field_errors"] {
                if let Some(found) = map.get(key).and_then(extract_message) {
                    return Some(found);
                }
            }
            let fields: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| extract_message(v).map(|m| format!("{field}: {m}")))
                .collect();
            (!fields.is_empty()).then(|| fields.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorKind::from_status(400), ErrorKind::BadRequest);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Forbidden);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::ServerError);
        assert_eq!(ErrorKind::from_status(502), ErrorKind::Unknown);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Unknown);
    }

    #[test]
    fn test_message_from_detail() {
        let err = ApiError::from_response(403, br#"{"detail":"Not your listing."}"#);
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert_eq!(err.status, Some(403));
        assert_eq!(err.message, "Not your listing.");
    }

    #[test]
    fn test_message_from_field_errors() {
        let err = ApiError::from_response(400, br#"{"title":["This field is required."]}"#);
        assert_eq!(err.message, "title: This field is required.");
    }

    #[test]
    fn test_default_message_for_html_body() {
        let err = ApiError::from_response(500, b"<html>oops</html>");
        assert_eq!(err.message, ErrorKind::ServerError.default_message());
    }

    #[test]
    fn test_redirects() {
        assert_eq!(ApiError::session_expired().redirect(), Some(Redirect::Login));
        assert_eq!(
            ApiError::from_response(404, b"").redirect(),
            Some(Redirect::NotFound)
        );
        assert_eq!(ApiError::from_response(400, b"").redirect(), None);
        assert_eq!(ApiError::network("refused").redirect(), None);
    }
}
