//! Conversations and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, ListingId, MessageId, UserId};

/// Minimal user reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    /// User id.
    pub id: UserId,
    /// Username.
    pub username: String,
}

/// Minimal listing reference carried by a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRef {
    /// Listing id.
    pub id: ListingId,
    /// Listing title.
    pub title: String,
}

/// Denormalized preview of the newest message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    /// Message text.
    pub content: String,
    /// When it was sent.
    pub timestamp: DateTime<Utc>,
    /// Who sent it.
    #[serde(default, alias = "sender")]
    pub sender_username: Option<String>,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            timestamp: message.timestamp,
            sender_username: Some(message.sender.username.clone()),
        }
    }
}

/// A conversation about a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation id.
    pub id: ConversationId,
    /// The listing being discussed.
    pub listing: ListingRef,
    /// Participants.
    #[serde(default)]
    pub participants: Vec<UserRef>,
    /// Newest message, if any.
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Owning conversation.
    #[serde(alias = "conversation")]
    pub conversation_id: ConversationId,
    /// Sender.
    pub sender: UserRef,
    /// Text.
    pub content: String,
    /// When it was sent.
    pub timestamp: DateTime<Utc>,
    /// Whether the recipient has read it.
    #[serde(default)]
    pub is_read: bool,
}
