//! # marketledger-core
//!
//! Client-side state for the `MarketLedger` marketplace client.
//!
//! This crate provides:
//! - **Entity Cache Store** - listings, categories, favorites, profiles and
//!   listing details with per-key load state and stale-response protection
//! - **Messaging Sync** - conversations, messages and unread counts kept
//!   current by cancellable pollers
//! - **Listing Validation** - draft normalization and field rules
//! - **Client State** - cookie consent and filter snapshots (`SQLite`)
//! - **Marketplace** - wiring of the above to session events

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
mod error;
pub mod listing;
mod marketplace;
pub mod messaging;
pub mod state;

pub use cache::{CacheEntry, CacheKey, EntityStore, Trigger};
pub use config::{PollingConfig, PollingConfigBuilder};
pub use error::{Error, Result};
pub use listing::{ValidationError, ValidationResult, normalize, validate_listing};
pub use marketplace::Marketplace;
pub use messaging::{
    DayGroup, DayLabel, MessagesUpdate, MessagingEngine, MessagingEvent, UnreadCounts, ViewPhase,
    group_by_day,
};
pub use state::ClientStateRepository;
