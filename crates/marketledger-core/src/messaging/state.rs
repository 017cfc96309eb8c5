//! Conversation view state and unread accounting.

use std::collections::HashMap;

use marketledger_api::ApiError;
use marketledger_api::types::ConversationId;

/// Phase of the open-conversation view.
///
/// ```text
/// Closed -> Loading -> Ready -(poll)-> Ready
///                        |              |
///                        +-> Error <----+
///                            |
///                            +-(tick or retry)-> Loading
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewPhase {
    /// No conversation is open.
    #[default]
    Closed,
    /// Messages are being fetched.
    Loading,
    /// Messages are shown and being polled.
    Ready,
    /// The last fetch failed; previously loaded messages stay visible.
    Error(ApiError),
}

/// Input to the view state machine.
#[derive(Debug, Clone)]
pub(crate) enum ViewEvent {
    Open,
    Loaded,
    Failed(ApiError),
    Tick,
    Retry,
    Close,
}

impl ViewPhase {
    /// Returns `true` while a conversation is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Returns the error of a failed fetch.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn next(&self, event: ViewEvent) -> Self {
        match (self, event) {
            (_, ViewEvent::Open) => Self::Loading,
            (_, ViewEvent::Close) | (Self::Closed, _) => Self::Closed,
            (_, ViewEvent::Loaded) => Self::Ready,
            (_, ViewEvent::Failed(err)) => Self::Error(err),
            (Self::Error(_), ViewEvent::Tick | ViewEvent::Retry) => Self::Loading,
            (phase, ViewEvent::Tick | ViewEvent::Retry) => phase.clone(),
        }
    }
}

/// Unread message counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadCounts {
    /// Unread messages across all conversations.
    pub total: u32,
    /// Unread messages per conversation.
    pub per_conversation: HashMap<ConversationId, u32>,
}

impl UnreadCounts {
    /// Unread count for one conversation.
    #[must_use]
    pub fn for_conversation(&self, id: ConversationId) -> u32 {
        self.per_conversation.get(&id).copied().unwrap_or(0)
    }

    /// Subtracts `count` newly read messages, never going below zero.
    pub(crate) fn mark_read(&mut self, id: ConversationId, count: u32) {
        let removed = match self.per_conversation.get_mut(&id) {
            Some(unread) => {
                let removed = (*unread).min(count);
                *unread -= removed;
                removed
            }
            None => count,
        };
        self.total = self.total.saturating_sub(removed);
    }
}
