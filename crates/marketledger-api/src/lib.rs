//! # marketledger-api
//!
//! HTTP client adapter for the `MarketLedger` marketplace API.
//!
//! ## Features
//!
//! - **Bearer auth**: the session's access token is attached to every request
//! - **Token recovery**: one refresh-and-replay on 401, session cleared if the
//!   refresh fails
//! - **Error taxonomy**: every failure classified into an [`ErrorKind`]
//! - **Notifications**: deduplicated per status within a burst window
//! - **Typed endpoints**: [`MarketApi`] covers listings, catalog, profiles and
//!   messaging
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use marketledger_api::{ApiClient, ClientConfig, MarketApi, TracingNotifier};
//!
//! let config = ClientConfig::new(url::Url::parse("https://market.example/api/")?);
//! let client = ApiClient::new(config, session, Arc::new(TracingNotifier))?;
//!
//! let page = client.list_listings(1, &Default::default()).await?;
//! for listing in page.results {
//!     println!("{} {}", listing.id, listing.title);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod api;
mod client;
mod config;
mod error;
mod notify;
pub mod types;

pub use api::MarketApi;
pub use client::{ApiClient, ApiResponse, FilePart, MultipartBody, RequestBody};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ApiError, ApiResult, ErrorKind, Redirect};
pub use notify::{NotificationGate, Notifier, TracingNotifier};
pub use reqwest::Method;
