//! In-memory `MarketApi` fake and fixtures shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use marketledger_api::types::{
    Category, CategoryId, Conversation, ConversationId, DeliveryOption, FilterSet, Listing,
    ListingDraft,
    ListingId, ListingRef, ListingStatus, ListingType, Message, MessageId, Page, PriceType,
    Profile, Subcategory, SubcategoryId, UserId, UserRef,
};
use marketledger_api::{ApiError, ApiResult, ErrorKind, MarketApi};
use marketledger_auth::{Identity, MemoryTokenStore, Session, TokenClient, TokenPair};
use url::Url;

/// Scripted marketplace backend.
#[derive(Default)]
pub struct FakeApi {
    /// Listing pages keyed by (search term, page).
    pub pages: Mutex<HashMap<(String, u32), Page<Listing>>>,
    /// Response delay per search term.
    pub page_delays: Mutex<HashMap<String, Duration>>,
    pub listings: Mutex<HashMap<ListingId, Listing>>,
    pub categories: Mutex<Vec<Category>>,
    pub subcategories: Mutex<HashMap<CategoryId, Vec<Subcategory>>>,
    pub favorites: Mutex<Vec<Listing>>,
    pub my_listings: Mutex<Vec<Listing>>,
    pub profiles: Mutex<HashMap<String, Profile>>,
    pub conversations: Mutex<Vec<Conversation>>,
    pub messages: Mutex<HashMap<ConversationId, Vec<Message>>>,
    pub unread_total: Mutex<u32>,
    pub unread_per_conversation: Mutex<HashMap<ConversationId, u32>>,
    pub marked: Mutex<Vec<MessageId>>,
    pub created_drafts: Mutex<Vec<ListingDraft>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    next_id: AtomicI64,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.next_id.store(1000, Ordering::SeqCst);
        Arc::new(api)
    }

    /// Number of calls made to an endpoint.
    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    /// Makes an endpoint fail with a server error until [`Self::recover`].
    pub fn fail(&self, name: &'static str) {
        self.failing.lock().unwrap().insert(name);
    }

    pub fn recover(&self, name: &'static str) {
        self.failing.lock().unwrap().remove(name);
    }

    /// Delays an endpoint's response; the data is read before the delay.
    pub fn delay(&self, name: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(name, delay);
    }

    async fn hold(&self, name: &'static str) {
        let delay = self.delays.lock().unwrap().get(name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn set_page(&self, search: &str, page: u32, results: Vec<Listing>, has_more: bool) {
        let next = has_more.then(|| format!("/listings/?page={}", page + 1));
        self.pages
            .lock()
            .unwrap()
            .insert((search.to_string(), page), Page { results, next });
    }

    fn record(&self, name: &'static str) -> ApiResult<()> {
        *self.calls.lock().unwrap().entry(name).or_default() += 1;
        if self.failing.lock().unwrap().contains(name) {
            return Err(ApiError::new(ErrorKind::ServerError, Some(500), "boom"));
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketApi for FakeApi {
    async fn list_listings(&self, page: u32, filters: &FilterSet) -> ApiResult<Page<Listing>> {
        self.record("list_listings")?;
        let search = filters.search.clone().unwrap_or_default();
        let delay = self.page_delays.lock().unwrap().get(&search).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&(search, page))
            .cloned()
            .unwrap_or(Page {
                results: Vec::new(),
                next: None,
            }))
    }

    async fn get_listing(&self, id: ListingId) -> ApiResult<Listing> {
        self.record("get_listing")?;
        self.listings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::new(ErrorKind::NotFound, Some(404), "Not found."))
    }

    async fn create_listing(&self, draft: &ListingDraft) -> ApiResult<Listing> {
        self.record("create_listing")?;
        self.created_drafts.lock().unwrap().push(draft.clone());
        let mut created = listing(self.next_id(), &draft.title);
        created.listing_type = draft.listing_type;
        created.price.clone_from(&draft.price);
        created.price_type = draft.price_type;
        self.listings
            .lock()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_listing(&self, id: ListingId, draft: &ListingDraft) -> ApiResult<Listing> {
        self.record("update_listing")?;
        let mut listings = self.listings.lock().unwrap();
        let stored = listings
            .get_mut(&id)
            .ok_or_else(|| ApiError::new(ErrorKind::NotFound, Some(404), "Not found."))?;
        stored.title.clone_from(&draft.title);
        stored.price.clone_from(&draft.price);
        Ok(stored.clone())
    }

    async fn delete_listing(&self, id: ListingId) -> ApiResult<()> {
        self.record("delete_listing")?;
        self.listings.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn toggle_favorite(&self, id: ListingId) -> ApiResult<bool> {
        self.record("toggle_favorite")?;
        let mut favorites = self.favorites.lock().unwrap();
        if favorites.iter().any(|l| l.id == id) {
            favorites.retain(|l| l.id != id);
            Ok(false)
        } else {
            let mut favorite = self
                .listings
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .unwrap_or_else(|| listing(id.get(), "favorite"));
            favorite.is_favorited = true;
            favorites.push(favorite);
            Ok(true)
        }
    }

    async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.record("categories")?;
        let categories = self.categories.lock().unwrap().clone();
        self.hold("categories").await;
        Ok(categories)
    }

    async fn subcategories(&self, category: CategoryId) -> ApiResult<Vec<Subcategory>> {
        self.record("subcategories")?;
        Ok(self
            .subcategories
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .unwrap_or_default())
    }

    async fn favorites(&self) -> ApiResult<Vec<Listing>> {
        self.record("favorites")?;
        let favorites = self.favorites.lock().unwrap().clone();
        self.hold("favorites").await;
        Ok(favorites)
    }

    async fn my_listings(&self) -> ApiResult<Vec<Listing>> {
        self.record("my_listings")?;
        Ok(self.my_listings.lock().unwrap().clone())
    }

    async fn profile(&self, username: &str) -> ApiResult<Profile> {
        self.record("profile")?;
        self.profiles
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .ok_or_else(|| ApiError::new(ErrorKind::NotFound, Some(404), "Not found."))
    }

    async fn user_listings(&self, username: &str) -> ApiResult<Vec<Listing>> {
        self.record("user_listings")?;
        Ok(self
            .listings
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.owner_username == username)
            .cloned()
            .collect())
    }

    async fn conversations(&self) -> ApiResult<Vec<Conversation>> {
        self.record("conversations")?;
        let conversations = self.conversations.lock().unwrap().clone();
        self.hold("conversations").await;
        Ok(conversations)
    }

    async fn create_conversation(&self, listing: ListingId) -> ApiResult<Conversation> {
        self.record("create_conversation")?;
        let mut conversations = self.conversations.lock().unwrap();
        if let Some(existing) = conversations.iter().find(|c| c.listing.id == listing) {
            return Ok(existing.clone());
        }
        let created = conversation(self.next_id(), listing.get());
        conversations.push(created.clone());
        Ok(created)
    }

    async fn messages(&self, conversation: ConversationId) -> ApiResult<Vec<Message>> {
        self.record("messages")?;
        let messages = self
            .messages
            .lock()
            .unwrap()
            .get(&conversation)
            .cloned()
            .unwrap_or_default();
        self.hold("messages").await;
        Ok(messages)
    }

    async fn send_message(&self, conversation: ConversationId, content: &str) -> ApiResult<Message> {
        self.record("send_message")?;
        let mut sent = message(self.next_id(), conversation.get(), 60, true);
        sent.content = content.to_string();
        self.messages
            .lock()
            .unwrap()
            .entry(conversation)
            .or_default()
            .push(sent.clone());
        Ok(sent)
    }

    async fn mark_as_read(&self, conversation: ConversationId, ids: &[MessageId]) -> ApiResult<()> {
        self.record("mark_as_read")?;
        self.marked.lock().unwrap().extend_from_slice(ids);
        let mut unread = self.unread_per_conversation.lock().unwrap();
        let count = unread.entry(conversation).or_default();
        let read = u32::try_from(ids.len()).unwrap();
        *count = count.saturating_sub(read);
        let mut total = self.unread_total.lock().unwrap();
        *total = total.saturating_sub(read);
        Ok(())
    }

    async fn unread_count(&self) -> ApiResult<u32> {
        self.record("unread_count")?;
        Ok(*self.unread_total.lock().unwrap())
    }

    async fn conversation_unread_counts(&self) -> ApiResult<HashMap<ConversationId, u32>> {
        self.record("conversation_unread_counts")?;
        Ok(self.unread_per_conversation.lock().unwrap().clone())
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
}

pub fn listing(id: i64, title: &str) -> Listing {
    Listing {
        id: ListingId::new(id),
        title: title.to_string(),
        description: String::new(),
        listing_type: ListingType::ItemSale,
        price: Some("10.00".to_string()),
        price_type: PriceType::Fixed,
        condition: None,
        category_id: CategoryId::new(1),
        subcategory_id: None,
        delivery_option: DeliveryOption::default(),
        location: None,
        event_date: None,
        status: ListingStatus::default(),
        owner_username: "ana".to_string(),
        images: Vec::new(),
        favorite_count: 0,
        view_count: 0,
        created_at: epoch(),
        is_favorited: false,
    }
}

pub fn subcategory(id: i64, category: i64) -> Subcategory {
    Subcategory {
        id: SubcategoryId::new(id),
        name: format!("sub {id}"),
        category_id: CategoryId::new(category),
    }
}

pub fn conversation(id: i64, listing: i64) -> Conversation {
    Conversation {
        id: ConversationId::new(id),
        listing: ListingRef {
            id: ListingId::new(listing),
            title: format!("listing {listing}"),
        },
        participants: Vec::new(),
        last_message: None,
        created_at: epoch(),
    }
}

/// A message sent `minutes` after the fixture epoch.
pub fn message(id: i64, conversation: i64, minutes: i64, is_read: bool) -> Message {
    Message {
        id: MessageId::new(id),
        conversation_id: ConversationId::new(conversation),
        sender: UserRef {
            id: UserId::new(8),
            username: "ben".to_string(),
        },
        content: format!("message {id}"),
        timestamp: epoch() + chrono::Duration::minutes(minutes),
        is_read,
    }
}

/// A session whose token endpoint is unreachable; it never refreshes.
pub fn signed_out_session() -> Arc<Session> {
    let client = TokenClient::new(&Url::parse("http://127.0.0.1:1/api/").unwrap()).unwrap();
    Arc::new(Session::new(client, Arc::new(MemoryTokenStore::new())))
}

pub fn signed_in_session() -> Arc<Session> {
    let session = signed_out_session();
    session.login(Identity::new(7, "ana"), TokenPair::new("a1", "r1"));
    session
}
