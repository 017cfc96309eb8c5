//! Persisted client state (cookie consent, last-used filters).

mod repository;

pub use repository::ClientStateRepository;
