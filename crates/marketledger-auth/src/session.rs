//! Session lifecycle and the provider contract consumed by the HTTP adapter.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::client::TokenClient;
use crate::error::{Error, Result};
use crate::identity::{AuthEvent, Identity, StoredSession};
use crate::store::TokenStore;
use crate::token::TokenPair;

/// Capacity of the auth event channel.
const EVENT_CAPACITY: usize = 16;

/// Source of the current identity and bearer credentials.
///
/// Stores react to [`AuthEvent`]s; the HTTP adapter uses the token and
/// refresh operations.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the signed-in user, if any.
    fn current_user(&self) -> Option<Identity>;

    /// Returns true if a user is signed in.
    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Returns the access token to attach to outgoing requests.
    fn access_token(&self) -> Option<String>;

    /// Obtains a new access token.
    ///
    /// `stale_access` is the token that was rejected; if the session already
    /// holds a different token the refresh is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the refresh is rejected.
    async fn refresh(&self, stale_access: Option<&str>) -> Result<()>;

    /// Ends the session after an unrecoverable authentication failure.
    fn expire(&self);

    /// Subscribes to session lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Token-backed session.
pub struct Session {
    state: RwLock<Option<StoredSession>>,
    client: TokenClient,
    store: Arc<dyn TokenStore>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.current_user().map(|u| u.username))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a signed-out session.
    #[must_use]
    pub fn new(client: TokenClient, store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(None),
            client,
            store,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<StoredSession>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<StoredSession>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn persist(&self, session: &StoredSession) {
        if let Err(e) = self.store.save(session) {
            warn!("Failed to persist session: {e}");
        }
    }

    /// Restores a persisted session.
    ///
    /// Sessions whose access token is expired and that carry no refresh token
    /// are discarded. Returns true if a session was restored.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub fn restore(&self) -> Result<bool> {
        let Some(stored) = self.store.load()? else {
            return Ok(false);
        };

        if !stored.tokens.is_renewable() {
            info!("Discarding unrenewable session for {}", stored.identity.username);
            self.store.clear()?;
            return Ok(false);
        }

        info!("Restored session for {}", stored.identity.username);
        let identity = stored.identity.clone();
        *self.write() = Some(stored);
        self.emit(AuthEvent::LoggedIn(identity));
        Ok(true)
    }

    /// Starts a session with an already-issued token pair.
    pub fn login(&self, identity: Identity, tokens: TokenPair) {
        let stored = StoredSession {
            identity: identity.clone(),
            tokens,
        };
        self.persist(&stored);
        *self.write() = Some(stored);
        info!("Signed in as {}", identity.username);
        self.emit(AuthEvent::LoggedIn(identity));
    }

    /// Exchanges credentials for tokens and starts a session.
    ///
    /// `resolve` maps the new tokens to the identity they belong to (usually
    /// by fetching the user's profile).
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    pub async fn sign_in<F, Fut>(&self, username: &str, password: &str, resolve: F) -> Result<Identity>
    where
        F: FnOnce(TokenPair) -> Fut + Send,
        Fut: std::future::Future<Output = Result<Identity>> + Send,
    {
        let tokens = self.client.obtain(username, password).await?;
        let identity = resolve(tokens.clone()).await?;
        self.login(identity.clone(), tokens);
        Ok(identity)
    }

    /// Ends the session at the user's request.
    pub fn logout(&self) {
        self.end("logout");
    }

    /// Replaces the identity after a profile change.
    ///
    /// # Errors
    ///
    /// Returns an error if no user is signed in.
    pub fn update_identity(&self, identity: Identity) -> Result<()> {
        let updated = {
            let mut state = self.write();
            let current = state.as_mut().ok_or(Error::NotAuthenticated)?;
            current.identity = identity.clone();
            current.clone()
        };
        self.persist(&updated);
        self.emit(AuthEvent::ProfileUpdated(identity));
        Ok(())
    }

    fn end(&self, reason: &str) {
        let previous = self.write().take();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored session: {e}");
        }
        if let Some(previous) = previous {
            info!("Session for {} ended ({reason})", previous.identity.username);
            self.emit(AuthEvent::LoggedOut);
        }
    }
}

#[async_trait]
impl SessionProvider for Session {
    fn current_user(&self) -> Option<Identity> {
        self.read().as_ref().map(|s| s.identity.clone())
    }

    fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.tokens.access.clone())
    }

    async fn refresh(&self, stale_access: Option<&str>) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.read().clone().ok_or(Error::NotAuthenticated)?;
        if stale_access.is_some_and(|stale| stale != current.tokens.access) {
            debug!("Access token already rotated, skipping refresh");
            return Ok(());
        }

        let tokens = self.client.refresh(&current.tokens).await?;

        let updated = {
            let mut state = self.write();
            // Signed out (or replaced) while the refresh was in flight
            match state.as_mut() {
                Some(live) if live.tokens.access == current.tokens.access => {
                    live.tokens = tokens;
                    live.clone()
                }
                _ => return Err(Error::NotAuthenticated),
            }
        };
        self.persist(&updated);
        debug!("Refreshed access token for {}", updated.identity.username);
        Ok(())
    }

    fn expire(&self) {
        self.end("expired");
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
