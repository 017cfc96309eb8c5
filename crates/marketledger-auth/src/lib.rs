//! # marketledger-auth
//!
//! Session and bearer token management for the `MarketLedger` marketplace
//! client.
//!
//! ## Features
//!
//! - **Token pairs**: access/refresh tokens with expiry read from the JWT
//! - **Token client**: credential exchange and refresh against the token endpoints
//! - **Session**: identity, single-flight refresh and lifecycle events
//! - **Persistence**: session stored in the platform keyring
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use marketledger_auth::{KeyringTokenStore, Session, SessionProvider, TokenClient};
//!
//! let base = url::Url::parse("https://market.example/api/")?;
//! let session = Session::new(TokenClient::new(&base)?, Arc::new(KeyringTokenStore::new()));
//!
//! if !session.restore()? {
//!     println!("Not signed in");
//! }
//!
//! let mut events = session.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod identity;
mod session;
mod store;
pub mod token;

pub use client::TokenClient;
pub use error::{Error, Result};
pub use identity::{AuthEvent, Identity, StoredSession};
pub use session::{Session, SessionProvider};
pub use store::{KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use token::TokenPair;
