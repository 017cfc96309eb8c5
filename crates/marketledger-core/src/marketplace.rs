//! Wiring between the session, the entity store and the messaging engine.

use std::sync::{Arc, Mutex, PoisonError};

use marketledger_api::MarketApi;
use marketledger_auth::{AuthEvent, SessionProvider};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{EntityStore, Trigger};
use crate::config::PollingConfig;
use crate::error::Result;
use crate::messaging::MessagingEngine;

/// A marketplace client: one entity store and one messaging engine sharing a
/// session, kept in step with its sign-in state.
pub struct Marketplace {
    session: Arc<dyn SessionProvider>,
    store: Arc<EntityStore>,
    messaging: Arc<MessagingEngine>,
    cancel: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("store", &self.store)
            .field("messaging", &self.messaging)
            .finish_non_exhaustive()
    }
}

impl Marketplace {
    /// Builds the store and engine on top of `api` and `session`.
    #[must_use]
    pub fn new(
        api: Arc<dyn MarketApi>,
        session: Arc<dyn SessionProvider>,
        config: PollingConfig,
    ) -> Self {
        let store = Arc::new(EntityStore::new(api.clone(), session.clone()));
        let messaging = MessagingEngine::new(api, session.clone(), config);
        Self {
            session,
            store,
            messaging,
            cancel: CancellationToken::new(),
            listener: Mutex::new(None),
        }
    }

    /// The entity cache.
    #[must_use]
    pub const fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// The messaging engine.
    #[must_use]
    pub const fn messaging(&self) -> &Arc<MessagingEngine> {
        &self.messaging
    }

    /// Starts following session events and loads the initial data.
    ///
    /// # Errors
    ///
    /// Initial fetch failures are recorded on their keys; this returns `Ok`.
    pub async fn start(&self) -> Result<()> {
        {
            let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
            if listener.is_none() {
                let mut events = self.session.subscribe();
                let store = self.store.clone();
                let messaging = self.messaging.clone();
                let cancel = self.cancel.clone();
                *listener = Some(tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            event = events.recv() => match event {
                                Ok(event) => handle_event(&store, &messaging, event).await,
                                Err(RecvError::Lagged(skipped)) => {
                                    warn!("Missed {skipped} session event(s)");
                                }
                                Err(RecvError::Closed) => break,
                            },
                        }
                    }
                    debug!("Session listener finished");
                }));
            }
        }

        if self.session.is_authenticated() {
            self.messaging.start_unread_polling();
        }
        info!("Marketplace client started");
        self.store.initialize().await
    }

    /// Stops the session listener and both pollers.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(listener) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            listener.abort();
        }
        self.messaging.shutdown();
        info!("Marketplace client shut down");
    }
}

impl Drop for Marketplace {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Applies one session event to the store and the engine.
async fn handle_event(
    store: &EntityStore,
    messaging: &MessagingEngine,
    event: AuthEvent,
) {
    match event {
        AuthEvent::LoggedIn(identity) => {
            info!("Signed in as {}", identity.username);
            messaging.start_unread_polling();
            store.on_login().await;
        }
        AuthEvent::LoggedOut => {
            info!("Signed out");
            messaging.on_logout();
            store.on_logout();
        }
        AuthEvent::ProfileUpdated(identity) => {
            for key in Trigger::ProfileUpdated(identity.username).keys() {
                if let Err(e) = store.invalidate(&key).await {
                    warn!("Failed to invalidate {key}: {e}");
                }
            }
        }
    }
}
