//! Messaging synchronization.
//!
//! The [`MessagingEngine`] owns the conversation list, the open
//! conversation's messages and the unread counts, and runs two pollers: one
//! for unread counts while signed in and one for the open conversation.

mod engine;
mod grouping;
mod poller;
mod state;

pub use engine::{MessagesUpdate, MessagingEngine, MessagingEvent};
pub use grouping::{DayGroup, DayLabel, group_by_day};
pub use state::{UnreadCounts, ViewPhase};
