//! Identity of the signed-in user and session lifecycle events.

use serde::{Deserialize, Serialize};

use crate::token::TokenPair;

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-side user id.
    pub user_id: i64,
    /// Unique username.
    pub username: String,
    /// Email address, if exposed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// Creates an identity without an email address.
    #[must_use]
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            email: None,
        }
    }
}

/// Session lifecycle event broadcast to interested stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in (or a persisted session was restored).
    LoggedIn(Identity),
    /// The session ended, either by user action or by refresh failure.
    LoggedOut,
    /// The signed-in user's profile changed.
    ProfileUpdated(Identity),
}

/// A session as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Who the tokens belong to.
    pub identity: Identity,
    /// Current token pair.
    pub tokens: TokenPair,
}
