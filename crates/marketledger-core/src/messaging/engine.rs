//! Messaging synchronization engine.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use marketledger_api::types::{Conversation, ConversationId, LastMessage, ListingId, Message, MessageId};
use marketledger_api::{ApiError, ErrorKind, MarketApi};
use marketledger_auth::SessionProvider;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::poller::Poller;
use super::state::{UnreadCounts, ViewEvent, ViewPhase};
use crate::cache::{CacheEntry, Slot};
use crate::config::PollingConfig;
use crate::error::{Error, Result};

/// Capacity of the messaging event channel.
const EVENT_CAPACITY: usize = 64;

/// Change notification published by the [`MessagingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingEvent {
    /// The conversation list changed.
    ConversationsChanged,
    /// Messages of the open conversation changed.
    MessagesChanged(ConversationId),
    /// Unread counts changed.
    UnreadChanged,
    /// The conversation view moved to a new phase.
    ViewChanged(ViewPhase),
}

/// Outcome of a message fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagesUpdate {
    /// The message list differs from what was shown before.
    pub changed: bool,
    /// Messages whose ids were not shown before.
    pub new_count: usize,
}

#[derive(Default)]
struct MessagingState {
    conversations: Slot<Vec<Conversation>>,
    /// Source of conversation request generations.
    generation: u64,
    open: Option<ConversationId>,
    messages: Vec<Message>,
    /// Bumped by local message edits so older message fetches are discarded.
    messages_generation: u64,
    view: ViewPhase,
    unread: UnreadCounts,
    /// Bumped by mark-as-read so older unread refreshes are discarded.
    unread_generation: u64,
    /// Bumped on logout so in-flight responses are discarded.
    epoch: u64,
}

/// Keeps conversations, the open conversation's messages and unread counts in
/// sync with the server through explicit fetches and two pollers.
pub struct MessagingEngine {
    api: Arc<dyn MarketApi>,
    session: Arc<dyn SessionProvider>,
    config: PollingConfig,
    state: Mutex<MessagingState>,
    events: broadcast::Sender<MessagingEvent>,
    unread_poller: Mutex<Option<Poller>>,
    conversation_poller: Mutex<Option<Poller>>,
    this: Weak<Self>,
}

impl std::fmt::Debug for MessagingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MessagingState {
    const fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the first conversation seen for every id.
fn dedup_conversations(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut seen = HashSet::new();
    let before = conversations.len();
    let deduped: Vec<_> = conversations
        .into_iter()
        .filter(|c| seen.insert(c.id))
        .collect();
    if deduped.len() != before {
        debug!(
            "Dropped {} duplicate conversation(s)",
            before - deduped.len()
        );
    }
    deduped
}

fn view_error(error: &Error) -> ApiError {
    error
        .as_api()
        .cloned()
        .unwrap_or_else(|| ApiError::new(ErrorKind::Unknown, None, error.to_string()))
}

impl MessagingEngine {
    /// Creates an idle engine.
    #[must_use]
    pub fn new(
        api: Arc<dyn MarketApi>,
        session: Arc<dyn SessionProvider>,
        config: PollingConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new_cyclic(|this| Self {
            api,
            session,
            config,
            state: Mutex::new(MessagingState::default()),
            events,
            unread_poller: Mutex::new(None),
            conversation_poller: Mutex::new(None),
            this: this.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, MessagingState> {
        lock(&self.state)
    }

    fn publish(&self, event: MessagingEvent) {
        let _ = self.events.send(event);
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MessagingEvent> {
        self.events.subscribe()
    }

    /// Replaces the conversation list, dropping duplicate ids.
    ///
    /// # Errors
    ///
    /// Failures are recorded on the conversation entry; this returns `Ok`.
    pub async fn fetch_conversations(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            debug!("Skipping conversations fetch without a signed-in user");
            return Ok(());
        }
        let (generation, epoch) = {
            let mut state = self.state();
            let generation = state.next_generation();
            state.conversations.begin(generation);
            (generation, state.epoch)
        };

        let result = self.api.conversations().await;

        let changed = {
            let mut state = self.state();
            if state.epoch != epoch || !state.conversations.is_current(generation) {
                debug!("Discarded superseded conversations response");
                return Ok(());
            }
            match result {
                Ok(conversations) => {
                    let conversations = dedup_conversations(conversations);
                    let changed = state.conversations.entry.data.as_ref() != Some(&conversations);
                    state.conversations.apply(generation, Ok(conversations));
                    changed
                }
                Err(error) => {
                    warn!("Failed to fetch conversations: {error}");
                    state.conversations.apply(generation, Err(error));
                    false
                }
            }
        };

        if changed {
            self.publish(MessagingEvent::ConversationsChanged);
        }
        Ok(())
    }

    /// Replaces the open conversation's messages with the server's list.
    ///
    /// A response for a conversation that is no longer open, or one that was
    /// requested before a message was sent or marked read locally, is dropped
    /// and reported as unchanged.
    ///
    /// # Errors
    ///
    /// Returns the API error; the shown messages stay as they were.
    pub async fn fetch_messages(&self, conversation: ConversationId) -> Result<MessagesUpdate> {
        let (generation, epoch) = {
            let state = self.state();
            (state.messages_generation, state.epoch)
        };
        let mut messages = self.api.messages(conversation).await?;
        messages.sort_by_key(|m| m.timestamp);

        let update = {
            let mut state = self.state();
            if state.epoch != epoch || state.open != Some(conversation) {
                debug!("Discarded messages for conversation {conversation} (no longer open)");
                return Ok(MessagesUpdate::default());
            }
            if state.messages_generation != generation {
                debug!("Discarded messages for conversation {conversation} (edited locally)");
                return Ok(MessagesUpdate::default());
            }
            if state.messages == messages {
                MessagesUpdate::default()
            } else {
                let known: HashSet<MessageId> = state.messages.iter().map(|m| m.id).collect();
                let new_count = messages.iter().filter(|m| !known.contains(&m.id)).count();
                state.messages = messages;
                MessagesUpdate {
                    changed: true,
                    new_count,
                }
            }
        };

        if update.changed {
            debug!(
                "Conversation {conversation} updated ({} new)",
                update.new_count
            );
            self.publish(MessagingEvent::MessagesChanged(conversation));
        }
        Ok(update)
    }

    /// Sends a message.
    ///
    /// The content is trimmed; blank content never reaches the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMessage`] for blank content, or the API error.
    pub async fn send_message(&self, conversation: ConversationId, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let epoch = self.state().epoch;
        let message = self.api.send_message(conversation, content).await?;
        debug!("Sent message {} to conversation {conversation}", message.id);

        let (messages_changed, conversations_changed) = {
            let mut state = self.state();
            if state.epoch != epoch {
                return Ok(message);
            }
            let messages_changed = state.open == Some(conversation)
                && !state.messages.iter().any(|m| m.id == message.id);
            if messages_changed {
                state.messages_generation += 1;
                state.messages.push(message.clone());
            }
            let conversations_changed = state
                .conversations
                .entry
                .data
                .iter_mut()
                .flatten()
                .find(|c| c.id == conversation)
                .is_some_and(|c| {
                    c.last_message = Some(LastMessage::from(&message));
                    true
                });
            if conversations_changed {
                let generation = state.next_generation();
                state.conversations.supersede(generation);
            }
            (messages_changed, conversations_changed)
        };

        if messages_changed {
            self.publish(MessagingEvent::MessagesChanged(conversation));
        }
        if conversations_changed {
            self.publish(MessagingEvent::ConversationsChanged);
        }
        Ok(message)
    }

    /// Starts (or resumes) a conversation about a listing.
    ///
    /// The returned conversation is added to the front of the list unless its
    /// id is already present.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn create_conversation(&self, listing: ListingId) -> Result<Conversation> {
        let epoch = self.state().epoch;
        let conversation = self.api.create_conversation(listing).await?;

        let inserted = {
            let mut state = self.state();
            let known = state
                .conversations
                .entry
                .data
                .iter()
                .flatten()
                .any(|c| c.id == conversation.id);
            if state.epoch == epoch && !known {
                let generation = state.next_generation();
                state.conversations.supersede(generation);
                state
                    .conversations
                    .entry
                    .data
                    .get_or_insert_with(Vec::new)
                    .insert(0, conversation.clone());
                true
            } else {
                false
            }
        };

        if inserted {
            info!(
                "Started conversation {} about listing {listing}",
                conversation.id
            );
            self.publish(MessagingEvent::ConversationsChanged);
        }
        Ok(conversation)
    }

    /// Returns the known conversation about a listing, creating one if needed.
    ///
    /// A buyer has at most one conversation per listing. Several known
    /// conversations about the same listing mean the current user owns it, so
    /// none of them is reused and the server decides.
    ///
    /// # Errors
    ///
    /// Returns the API error when a conversation had to be created.
    pub async fn create_conversation_from_listing(&self, listing: ListingId) -> Result<Conversation> {
        let known = {
            let state = self.state();
            let mut matching = state
                .conversations
                .entry
                .data
                .iter()
                .flatten()
                .filter(|c| c.listing.id == listing);
            match (matching.next(), matching.next()) {
                (Some(conversation), None) => Some(conversation.clone()),
                _ => None,
            }
        };
        if let Some(conversation) = known {
            debug!(
                "Reusing conversation {} for listing {listing}",
                conversation.id
            );
            return Ok(conversation);
        }
        self.create_conversation(listing).await
    }

    /// Marks messages as read, then refreshes the unread counts once.
    ///
    /// # Errors
    ///
    /// Returns the API error of the mark-as-read call or of the refresh.
    pub async fn mark_messages_as_read(
        &self,
        conversation: ConversationId,
        ids: &[MessageId],
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut unique = HashSet::new();
        let ids: Vec<MessageId> = ids.iter().copied().filter(|id| unique.insert(*id)).collect();

        self.state().unread_generation += 1;
        self.api.mark_as_read(conversation, &ids).await?;

        let flipped = {
            let mut guard = self.state();
            let state = &mut *guard;
            state.unread_generation += 1;
            state.messages_generation += 1;

            let mut flipped = 0_u32;
            let mut already_read = 0_u32;
            for message in &mut state.messages {
                if message.conversation_id == conversation && unique.contains(&message.id) {
                    if message.is_read {
                        already_read += 1;
                    } else {
                        message.is_read = true;
                        flipped += 1;
                    }
                }
            }
            let newly_read = u32::try_from(ids.len())
                .unwrap_or(u32::MAX)
                .saturating_sub(already_read);
            state.unread.mark_read(conversation, newly_read);
            flipped
        };

        debug!("Marked {} message(s) read in conversation {conversation}", ids.len());
        if flipped > 0 {
            self.publish(MessagingEvent::MessagesChanged(conversation));
        }
        self.publish(MessagingEvent::UnreadChanged);

        self.refresh_unread_counts().await
    }

    /// Fetches the total and per-conversation unread counts.
    ///
    /// Skipped without a signed-in user. The result is dropped if messages
    /// were marked read while it was in flight.
    ///
    /// # Errors
    ///
    /// Returns the API error of either count request.
    pub async fn refresh_unread_counts(&self) -> Result<()> {
        if self.session.current_user().is_none() {
            debug!("Skipping unread refresh without a signed-in user");
            return Ok(());
        }

        let (generation, epoch) = {
            let state = self.state();
            (state.unread_generation, state.epoch)
        };
        let (total, per_conversation) = tokio::join!(
            self.api.unread_count(),
            self.api.conversation_unread_counts()
        );
        let counts = UnreadCounts {
            total: total?,
            per_conversation: per_conversation?,
        };

        let changed = {
            let mut state = self.state();
            if state.unread_generation != generation || state.epoch != epoch {
                debug!("Discarded stale unread counts");
                return Ok(());
            }
            if state.unread == counts {
                false
            } else {
                state.unread = counts;
                true
            }
        };

        if changed {
            self.publish(MessagingEvent::UnreadChanged);
        }
        Ok(())
    }

    /// Starts the unread poller; the first refresh runs right away.
    ///
    /// Does nothing if the poller is already running.
    pub fn start_unread_polling(&self) {
        let mut poller = lock(&self.unread_poller);
        if poller.as_ref().is_some_and(Poller::is_running) {
            debug!("Unread polling already running");
            return;
        }

        let engine = self.this.clone();
        *poller = Some(Poller::spawn(
            "unread",
            self.config.unread_interval,
            true,
            move || {
                let engine = engine.clone();
                async move {
                    let Some(engine) = engine.upgrade() else {
                        return false;
                    };
                    if let Err(e) = engine.refresh_unread_counts().await {
                        warn!("Unread poll failed: {e}");
                    }
                    true
                }
            },
        ));
        info!(
            "Started unread polling every {:?}",
            self.config.unread_interval
        );
    }

    /// Stops the unread poller.
    pub fn stop_unread_polling(&self) {
        if lock(&self.unread_poller).take().is_some() {
            info!("Stopped unread polling");
        }
    }

    /// Whether the unread poller is running.
    #[must_use]
    pub fn is_unread_polling(&self) -> bool {
        lock(&self.unread_poller)
            .as_ref()
            .is_some_and(Poller::is_running)
    }

    /// Whether the open conversation is being polled.
    #[must_use]
    pub fn is_conversation_polling(&self) -> bool {
        lock(&self.conversation_poller)
            .as_ref()
            .is_some_and(Poller::is_running)
    }

    fn set_view(&self, event: ViewEvent) {
        let changed = {
            let mut state = self.state();
            let next = state.view.next(event);
            if next == state.view {
                None
            } else {
                state.view = next.clone();
                Some(next)
            }
        };
        if let Some(phase) = changed {
            self.publish(MessagingEvent::ViewChanged(phase));
        }
    }

    /// Moves the view to `Ready` or `Error` for a fetch of `conversation`.
    fn settle(&self, conversation: ConversationId, result: Result<MessagesUpdate>) -> Result<()> {
        if self.state().open != Some(conversation) {
            return result.map(|_| ());
        }
        match result {
            Ok(_) => {
                self.set_view(ViewEvent::Loaded);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load conversation {conversation}: {e}");
                self.set_view(ViewEvent::Failed(view_error(&e)));
                Err(e)
            }
        }
    }

    /// Opens a conversation: loads its messages and starts polling it.
    ///
    /// Any previously open conversation stops being polled. The poller is
    /// started even when the initial load fails so the view can recover.
    ///
    /// # Errors
    ///
    /// Returns the error of the initial load.
    pub async fn open_conversation(&self, conversation: ConversationId) -> Result<()> {
        self.stop_conversation_poller();
        {
            let mut state = self.state();
            state.open = Some(conversation);
            state.messages.clear();
        }
        info!("Opened conversation {conversation}");
        self.publish(MessagingEvent::MessagesChanged(conversation));
        self.set_view(ViewEvent::Open);

        let result = self.fetch_messages(conversation).await;
        let outcome = self.settle(conversation, result);
        self.start_conversation_poller(conversation);
        outcome
    }

    fn start_conversation_poller(&self, conversation: ConversationId) {
        let mut poller = lock(&self.conversation_poller);
        if self.state().open != Some(conversation) {
            debug!("Conversation {conversation} closed before polling started");
            return;
        }

        let engine = self.this.clone();
        *poller = Some(Poller::spawn(
            "conversation",
            self.config.conversation_interval,
            false,
            move || {
                let engine = engine.clone();
                async move {
                    match engine.upgrade() {
                        Some(engine) => engine.poll_conversation(conversation).await,
                        None => false,
                    }
                }
            },
        ));
    }

    fn stop_conversation_poller(&self) {
        lock(&self.conversation_poller).take();
    }

    /// One poll tick; returns `false` once the conversation is closed.
    async fn poll_conversation(&self, conversation: ConversationId) -> bool {
        if self.state().open != Some(conversation) {
            return false;
        }
        self.set_view(ViewEvent::Tick);
        let result = self.fetch_messages(conversation).await;
        if let Err(e) = self.settle(conversation, result) {
            debug!("Poll of conversation {conversation} failed: {e}");
        }
        true
    }

    /// Retries loading the open conversation after a failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the reload.
    pub async fn retry(&self) -> Result<()> {
        let conversation = {
            let state = self.state();
            match (state.open, &state.view) {
                (Some(id), ViewPhase::Error(_)) => id,
                _ => return Ok(()),
            }
        };
        self.set_view(ViewEvent::Retry);
        let result = self.fetch_messages(conversation).await;
        self.settle(conversation, result)
    }

    /// Closes the open conversation and stops polling it.
    pub fn close_conversation(&self) {
        self.stop_conversation_poller();
        let closed = {
            let mut state = self.state();
            state.messages.clear();
            state.open.take()
        };
        if let Some(conversation) = closed {
            info!("Closed conversation {conversation}");
            self.publish(MessagingEvent::MessagesChanged(conversation));
        }
        self.set_view(ViewEvent::Close);
    }

    /// Stops both pollers and clears all messaging state.
    pub fn on_logout(&self) {
        self.stop_unread_polling();
        self.stop_conversation_poller();
        {
            let mut state = self.state();
            *state = MessagingState {
                epoch: state.epoch + 1,
                generation: state.generation,
                messages_generation: state.messages_generation + 1,
                unread_generation: state.unread_generation + 1,
                ..MessagingState::default()
            };
        }
        info!("Cleared messaging state");
        self.publish(MessagingEvent::ConversationsChanged);
        self.publish(MessagingEvent::UnreadChanged);
        self.publish(MessagingEvent::ViewChanged(ViewPhase::Closed));
    }

    /// Stops both pollers.
    pub fn shutdown(&self) {
        self.stop_unread_polling();
        self.stop_conversation_poller();
        debug!("Messaging engine shut down");
    }

    /// Snapshot of the conversation list.
    #[must_use]
    pub fn conversations(&self) -> CacheEntry<Vec<Conversation>> {
        self.state().conversations.entry.clone()
    }

    /// Messages of the open conversation, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// The open conversation.
    #[must_use]
    pub fn open_conversation_id(&self) -> Option<ConversationId> {
        self.state().open
    }

    /// Current view phase.
    #[must_use]
    pub fn view(&self) -> ViewPhase {
        self.state().view.clone()
    }

    /// Current unread counts.
    #[must_use]
    pub fn unread(&self) -> UnreadCounts {
        self.state().unread.clone()
    }
}
