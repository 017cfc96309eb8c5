//! `MarketLedger` - command-line marketplace client
//!
//! Restores (or starts) a session, loads the marketplace cache, keeps unread
//! counts polled and logs changes until interrupted.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod notifier;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use marketledger_api::types::Profile;
use marketledger_api::{ApiClient, ClientConfig, Notifier, TracingNotifier};
use marketledger_auth::{Identity, KeyringTokenStore, Session, TokenClient, TokenPair};
use marketledger_core::{CacheKey, ClientStateRepository, Marketplace, MessagingEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use notifier::DesktopNotifier;
use settings::AppSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketledger=debug,marketledger_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MarketLedger");

    let settings = settings::load_settings().await?;
    if !settings::config_dir().join("settings.json").exists() {
        settings::save_settings(&settings).await?;
    }
    let base_url = Url::parse(&settings.api_base_url)
        .with_context(|| format!("invalid api_base_url {:?}", settings.api_base_url))?;

    let session = Arc::new(Session::new(
        TokenClient::new(&base_url)?,
        Arc::new(KeyringTokenStore::new()),
    ));
    if !session.restore()? {
        sign_in_from_env(&session, &base_url).await?;
    }

    let notifier: Arc<dyn Notifier> = if settings.desktop_notifications {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(TracingNotifier)
    };
    let config = ClientConfig::builder(base_url)
        .request_timeout(settings.request_timeout())
        .build();
    let client = Arc::new(ApiClient::new(config, session.clone(), notifier)?);

    let data_dir = settings::data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;
    let db_path = settings::database_path(&data_dir)?;
    let state = ClientStateRepository::new(&db_path).await?;

    let marketplace = Marketplace::new(client, session.clone(), settings.polling());
    run(&marketplace, &state, &settings).await?;

    state
        .save_filter_snapshot(&marketplace.store().listing_filters())
        .await?;
    marketplace.shutdown();
    info!("Goodbye");
    Ok(())
}

/// Loads the cache, then logs changes until Ctrl-C.
async fn run(
    marketplace: &Marketplace,
    state: &ClientStateRepository,
    settings: &AppSettings,
) -> anyhow::Result<()> {
    let mut cache_events = marketplace.store().subscribe();
    let mut messaging_events = marketplace.messaging().subscribe();

    marketplace.start().await?;
    if let Some(filters) = state.filter_snapshot().await?
        && !filters.is_empty()
    {
        info!("Restoring saved filters");
        marketplace.store().fetch_listings(true, &filters).await?;
    }
    marketplace.messaging().fetch_conversations().await?;
    report(marketplace);

    if !state.cookie_consent().await? {
        info!("Cookie consent not given yet; only essential data is stored");
    }
    info!(
        "Polling unread counts every {}s; press Ctrl-C to quit",
        settings.unread_poll_secs
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            event = cache_events.recv() => match event {
                Ok(key) => log_cache_change(marketplace, &key),
                Err(RecvError::Lagged(skipped)) => warn!("Missed {skipped} cache event(s)"),
                Err(RecvError::Closed) => break,
            },
            event = messaging_events.recv() => match event {
                Ok(MessagingEvent::UnreadChanged) => {
                    info!("Unread messages: {}", marketplace.messaging().unread().total);
                }
                Ok(MessagingEvent::ConversationsChanged) => {
                    let count = marketplace
                        .messaging()
                        .conversations()
                        .data
                        .map_or(0, |c| c.len());
                    info!("Conversations: {count}");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!("Missed {skipped} messaging event(s)"),
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn report(marketplace: &Marketplace) {
    let store = marketplace.store();
    let listings = store.listings();
    match (&listings.data, &listings.error) {
        (_, Some(error)) => warn!("Listings unavailable: {error}"),
        (Some(items), None) => info!(
            "{} listing(s) loaded{}",
            items.len(),
            if store.has_more_listings() { ", more available" } else { "" }
        ),
        (None, None) => info!("No listings loaded"),
    }
    if let Some(categories) = store.categories().data {
        info!("{} categories", categories.len());
    }
    if let Some(favorites) = store.favorites().data {
        info!("{} favorite(s)", favorites.len());
    }
}

fn log_cache_change(marketplace: &Marketplace, key: &CacheKey) {
    let store = marketplace.store();
    match key {
        CacheKey::Listings => {
            let count = store.listings().data.map_or(0, |l| l.len());
            info!("Listings updated ({count})");
        }
        CacheKey::Favorites => {
            let count = store.favorites().data.map_or(0, |l| l.len());
            info!("Favorites updated ({count})");
        }
        other => tracing::debug!("{other} updated"),
    }
}

/// Signs in with `MARKETLEDGER_USERNAME` / `MARKETLEDGER_PASSWORD` if set.
async fn sign_in_from_env(session: &Session, base_url: &Url) -> anyhow::Result<()> {
    let (Ok(username), Ok(password)) = (
        std::env::var("MARKETLEDGER_USERNAME"),
        std::env::var("MARKETLEDGER_PASSWORD"),
    ) else {
        info!("No saved session; browsing anonymously");
        return Ok(());
    };

    let http = reqwest::Client::new();
    let profile_url = base_url.join(&format!("profiles/{username}/"))?;
    let identity = session
        .sign_in(&username, &password, move |tokens: TokenPair| async move {
            let profile: Profile = http
                .get(profile_url)
                .bearer_auth(&tokens.access)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok(Identity::new(profile.id.get(), profile.username))
        })
        .await
        .context("sign-in failed")?;

    info!("Signed in as {}", identity.username);
    Ok(())
}
