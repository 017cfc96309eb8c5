//! Cache entries and their request generations.

use chrono::{DateTime, Utc};
use marketledger_api::ApiError;

/// Cached value for one key along with its load state.
///
/// While `loading` is set `error` is always `None`; a successful load clears
/// the error and stamps `fetched_at`. A failed load keeps the previous data.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// Last successfully fetched value.
    pub data: Option<T>,
    /// A request for this key is in flight.
    pub loading: bool,
    /// Error from the last request, if it failed.
    pub error: Option<ApiError>,
    /// When `data` was fetched.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            fetched_at: None,
        }
    }
}

impl<T> CacheEntry<T> {
    /// Marks a request as started.
    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Stores a successful result.
    pub fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
        self.fetched_at = Some(Utc::now());
    }

    /// Records a failure, keeping stale data visible.
    pub fn fail(&mut self, error: ApiError) {
        self.loading = false;
        self.error = Some(error);
    }

    /// Whether data has been loaded at least once.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.data.is_some()
    }
}

/// A cache entry plus the generation of the request allowed to write it.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub entry: CacheEntry<T>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            entry: CacheEntry::default(),
            generation: 0,
        }
    }
}

impl<T> Slot<T> {
    /// Starts a request with the given generation, superseding any other.
    pub fn begin(&mut self, generation: u64) {
        self.generation = generation;
        self.entry.begin_loading();
    }

    /// Whether a response for `generation` may still be applied.
    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Applies a response if its generation is still current.
    pub fn apply(&mut self, generation: u64, result: Result<T, ApiError>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        match result {
            Ok(data) => self.entry.succeed(data),
            Err(error) => self.entry.fail(error),
        }
        true
    }

    /// Supersedes any in-flight request while keeping the current data.
    ///
    /// Returns whether a request was in flight.
    pub fn supersede(&mut self, generation: u64) -> bool {
        self.generation = generation;
        std::mem::replace(&mut self.entry.loading, false)
    }

    /// Drops data and supersedes any in-flight request.
    pub fn clear(&mut self, generation: u64) {
        self.entry = CacheEntry::default();
        self.generation = generation;
    }
}
