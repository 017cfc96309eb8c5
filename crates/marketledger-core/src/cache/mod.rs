//! Entity cache store.
//!
//! Holds listings, categories, favorites, profiles and listing details keyed
//! by [`CacheKey`], with per-key load state, request generations and an
//! explicit [`Trigger`] table for follow-up refetches.

mod entry;
mod key;
mod store;
mod trigger;

pub use entry::CacheEntry;
pub(crate) use entry::Slot;
pub use key::CacheKey;
pub use store::EntityStore;
pub use trigger::Trigger;
