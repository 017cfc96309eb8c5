//! Entity cache store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use marketledger_api::types::{
    Category, CategoryId, FilterSet, Listing, ListingDraft, ListingId, Profile, Subcategory,
};
use marketledger_api::{ApiResult, MarketApi};
use marketledger_auth::SessionProvider;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::entry::{CacheEntry, Slot};
use super::key::CacheKey;
use super::trigger::Trigger;
use crate::error::{Error, Result};
use crate::listing::{normalize, validate_listing};

/// Capacity of the change event channel.
const EVENT_CAPACITY: usize = 64;

/// Paged listings collection with its cursor.
struct ListingsState {
    slot: Slot<Vec<Listing>>,
    /// Last page applied, 0 before the first.
    page: u32,
    has_more: bool,
    /// Filters recorded by the latest reset.
    filters: FilterSet,
}

impl Default for ListingsState {
    fn default() -> Self {
        Self {
            slot: Slot::default(),
            page: 0,
            has_more: true,
            filters: FilterSet::default(),
        }
    }
}

#[derive(Default)]
struct StoreState {
    generation: u64,
    listings: ListingsState,
    categories: Slot<Vec<Category>>,
    subcategories: HashMap<CategoryId, Slot<Vec<Subcategory>>>,
    favorites: Slot<Vec<Listing>>,
    my_listings: Slot<Vec<Listing>>,
    details: HashMap<ListingId, Slot<Listing>>,
    profiles: HashMap<String, Slot<Profile>>,
    user_listings: HashMap<String, Slot<Vec<Listing>>>,
}

impl StoreState {
    const fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn find_listing(&self, id: ListingId) -> Option<&Listing> {
        self.details
            .get(&id)
            .and_then(|slot| slot.entry.data.as_ref())
            .or_else(|| find_in(self.listings.slot.entry.data.as_ref(), id))
            .or_else(|| find_in(self.my_listings.entry.data.as_ref(), id))
            .or_else(|| find_in(self.favorites.entry.data.as_ref(), id))
            .or_else(|| {
                self.user_listings
                    .values()
                    .find_map(|slot| find_in(slot.entry.data.as_ref(), id))
            })
    }

    /// Sets the favorite flag everywhere the listing is cached and adjusts
    /// favorites membership. Returns the keys that changed.
    fn set_favorited(&mut self, id: ListingId, is_favorited: bool) -> Vec<CacheKey> {
        let mut changed = Vec::new();

        if flag_listings(self.listings.slot.entry.data.as_mut(), id, is_favorited) {
            changed.push(CacheKey::Listings);
        }
        if flag_listings(self.my_listings.entry.data.as_mut(), id, is_favorited) {
            changed.push(CacheKey::MyListings);
        }
        for (username, slot) in &mut self.user_listings {
            if flag_listings(slot.entry.data.as_mut(), id, is_favorited) {
                changed.push(CacheKey::UserListings(username.clone()));
            }
        }
        if let Some(listing) = self
            .details
            .get_mut(&id)
            .and_then(|slot| slot.entry.data.as_mut())
            .filter(|listing| listing.is_favorited != is_favorited)
        {
            listing.is_favorited = is_favorited;
            changed.push(CacheKey::ListingDetail(id));
        }

        let known = self.find_listing(id).cloned();
        if let Some(favorites) = self.favorites.entry.data.as_mut() {
            let present = favorites.iter().any(|l| l.id == id);
            if is_favorited && !present {
                if let Some(mut listing) = known {
                    listing.is_favorited = true;
                    favorites.insert(0, listing);
                    changed.push(CacheKey::Favorites);
                }
            } else if !is_favorited && present {
                favorites.retain(|l| l.id != id);
                changed.push(CacheKey::Favorites);
            }
        }

        changed
    }
}

fn find_in(items: Option<&Vec<Listing>>, id: ListingId) -> Option<&Listing> {
    items?.iter().find(|l| l.id == id)
}

fn flag_listings(items: Option<&mut Vec<Listing>>, id: ListingId, is_favorited: bool) -> bool {
    let mut changed = false;
    for listing in items.into_iter().flatten() {
        if listing.id == id && listing.is_favorited != is_favorited {
            listing.is_favorited = is_favorited;
            changed = true;
        }
    }
    changed
}

fn remove_listing(items: Option<&mut Vec<Listing>>, id: ListingId) -> bool {
    items.is_some_and(|items| {
        let before = items.len();
        items.retain(|l| l.id != id);
        items.len() != before
    })
}

/// Cache of remote marketplace entities keyed by [`CacheKey`].
///
/// Every key carries a request generation; a response is applied only if no
/// newer request, invalidation or logout touched the key since it was sent.
pub struct EntityStore {
    api: Arc<dyn MarketApi>,
    session: Arc<dyn SessionProvider>,
    state: Mutex<StoreState>,
    events: broadcast::Sender<CacheKey>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(api: Arc<dyn MarketApi>, session: Arc<dyn SessionProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            session,
            state: Mutex::new(StoreState::default()),
            events,
            initialized: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, key: CacheKey) {
        // No subscribers is fine
        let _ = self.events.send(key);
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheKey> {
        self.events.subscribe()
    }

    /// Starts a request on a slot unless `skip` says the entry is fine as is.
    fn begin<T, S>(&self, slot: &S, skip: impl FnOnce(&CacheEntry<T>) -> bool) -> Option<u64>
    where
        S: for<'a> Fn(&'a mut StoreState) -> &'a mut Slot<T>,
    {
        let mut guard = self.state();
        if skip(&slot(&mut *guard).entry) {
            return None;
        }
        let generation = guard.next_generation();
        slot(&mut *guard).begin(generation);
        Some(generation)
    }

    fn finish<T, S>(&self, key: CacheKey, slot: &S, generation: u64, result: &ApiResult<T>)
    where
        T: Clone,
        S: for<'a> Fn(&'a mut StoreState) -> &'a mut Slot<T>,
    {
        if let Err(error) = result {
            warn!("Failed to fetch {key}: {error}");
        }
        let applied = slot(&mut *self.state()).apply(generation, result.clone());
        if applied {
            self.publish(key);
        } else {
            debug!("Discarded stale response for {key}");
        }
    }

    /// Fetches into a slot, superseding any request already in flight.
    async fn load<T, S, F>(&self, key: CacheKey, slot: S, request: F) -> ApiResult<T>
    where
        T: Clone,
        S: for<'a> Fn(&'a mut StoreState) -> &'a mut Slot<T>,
        F: Future<Output = ApiResult<T>>,
    {
        let generation = self.begin(&slot, |_| false).unwrap_or_default();
        let result = request.await;
        self.finish(key, &slot, generation, &result);
        result
    }

    /// Like [`Self::load`] but does nothing when `skip` holds for the entry.
    async fn load_unless<T, S, F>(
        &self,
        key: CacheKey,
        slot: S,
        skip: impl FnOnce(&CacheEntry<T>) -> bool,
        request: F,
    ) -> Option<ApiResult<T>>
    where
        T: Clone,
        S: for<'a> Fn(&'a mut StoreState) -> &'a mut Slot<T>,
        F: Future<Output = ApiResult<T>>,
    {
        let Some(generation) = self.begin(&slot, skip) else {
            debug!("Skipping fetch of {key}");
            return None;
        };
        let result = request.await;
        self.finish(key, &slot, generation, &result);
        Some(result)
    }

    /// Fetches listings.
    ///
    /// With `reset`, pagination restarts at page 1 using `filters` (blank
    /// values stripped) and any in-flight page is superseded. Without it the
    /// next page is appended using the filters of the latest reset; `filters`
    /// is ignored and the call is a no-op while a page is loading or when the
    /// server reported no further pages.
    ///
    /// # Errors
    ///
    /// Failures are recorded on [`CacheKey::Listings`]; this returns `Ok`.
    pub async fn fetch_listings(&self, reset: bool, filters: &FilterSet) -> Result<()> {
        let (generation, page, filters) = {
            let mut guard = self.state();
            let generation = guard.next_generation();
            let listings = &mut guard.listings;
            if reset {
                listings.filters = filters.stripped();
                listings.page = 0;
                listings.has_more = true;
            } else if listings.slot.entry.loading || !listings.has_more {
                debug!(
                    "Skipping listings page (loading: {}, has_more: {})",
                    listings.slot.entry.loading, listings.has_more
                );
                return Ok(());
            }
            listings.slot.begin(generation);
            (generation, listings.page + 1, listings.filters.clone())
        };

        debug!("Fetching listings page {page}");
        let result = self.api.list_listings(page, &filters).await;

        let applied = {
            let mut guard = self.state();
            let listings = &mut guard.listings;
            if listings.slot.is_current(generation) {
                match result {
                    Ok(fetched) => {
                        let has_more = fetched.has_more();
                        let mut items = if page == 1 {
                            Vec::new()
                        } else {
                            listings.slot.entry.data.take().unwrap_or_default()
                        };
                        for listing in fetched.results {
                            if !items.iter().any(|l| l.id == listing.id) {
                                items.push(listing);
                            }
                        }
                        listings.page = page;
                        listings.has_more = has_more;
                        listings.slot.entry.succeed(items);
                    }
                    Err(error) => {
                        warn!("Failed to fetch listings page {page}: {error}");
                        listings.slot.entry.fail(error);
                    }
                }
                true
            } else {
                false
            }
        };

        if applied {
            self.publish(CacheKey::Listings);
        } else {
            debug!("Discarded superseded listings page {page}");
        }
        Ok(())
    }

    /// Fetches categories once; later calls are no-ops until invalidated.
    ///
    /// # Errors
    ///
    /// Failures are recorded on [`CacheKey::Categories`]; this returns `Ok`.
    pub async fn fetch_categories(&self) -> Result<()> {
        self.load_unless(
            CacheKey::Categories,
            |s| &mut s.categories,
            |entry| entry.loading || entry.data.as_ref().is_some_and(|c| !c.is_empty()),
            self.api.categories(),
        )
        .await;
        Ok(())
    }

    /// Fetches the subcategories of a category once.
    ///
    /// A failed fetch caches an empty list alongside the error.
    ///
    /// # Errors
    ///
    /// Failures are recorded on the key; this returns `Ok`.
    pub async fn fetch_subcategories(&self, category: Option<CategoryId>) -> Result<()> {
        let Some(category) = category else {
            return Ok(());
        };
        let outcome = self
            .load_unless(
                CacheKey::Subcategories(category),
                move |s| s.subcategories.entry(category).or_default(),
                |entry| entry.loading || entry.is_loaded(),
                self.api.subcategories(category),
            )
            .await;

        if matches!(outcome, Some(Err(_))) {
            let mut guard = self.state();
            if let Some(slot) = guard.subcategories.get_mut(&category)
                && slot.entry.error.is_some()
                && slot.entry.data.is_none()
            {
                slot.entry.data = Some(Vec::new());
            }
        }
        Ok(())
    }

    /// Fetches a listing's detail record.
    ///
    /// When several fetches for the same listing overlap, the last one issued
    /// is the one cached.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous detail stays cached.
    pub async fn fetch_listing(&self, id: ListingId) -> Result<Listing> {
        self.load(
            CacheKey::ListingDetail(id),
            move |s| s.details.entry(id).or_default(),
            self.api.get_listing(id),
        )
        .await
        .map_err(Error::from)
    }

    /// Replaces the favorites collection; skipped when signed out.
    ///
    /// # Errors
    ///
    /// Failures are recorded on [`CacheKey::Favorites`]; this returns `Ok`.
    pub async fn fetch_favorites(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            debug!("Skipping favorites fetch without a signed-in user");
            return Ok(());
        }
        let _ = self
            .load(CacheKey::Favorites, |s| &mut s.favorites, self.api.favorites())
            .await;
        Ok(())
    }

    /// Replaces the current user's listings; skipped when signed out.
    ///
    /// # Errors
    ///
    /// Failures are recorded on [`CacheKey::MyListings`]; this returns `Ok`.
    pub async fn fetch_my_listings(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            debug!("Skipping my listings fetch without a signed-in user");
            return Ok(());
        }
        let _ = self
            .load(CacheKey::MyListings, |s| &mut s.my_listings, self.api.my_listings())
            .await;
        Ok(())
    }

    /// Replaces a user's public profile.
    ///
    /// # Errors
    ///
    /// Failures are recorded on the key; this returns `Ok`.
    pub async fn fetch_profile(&self, username: &str) -> Result<()> {
        let name = username.to_string();
        let _ = self
            .load(
                CacheKey::Profile(name.clone()),
                move |s| s.profiles.entry(name.clone()).or_default(),
                self.api.profile(username),
            )
            .await;
        Ok(())
    }

    /// Replaces a user's public listings.
    ///
    /// # Errors
    ///
    /// Failures are recorded on the key; this returns `Ok`.
    pub async fn fetch_user_listings(&self, username: &str) -> Result<()> {
        let name = username.to_string();
        let _ = self
            .load(
                CacheKey::UserListings(name.clone()),
                move |s| s.user_listings.entry(name.clone()).or_default(),
                self.api.user_listings(username),
            )
            .await;
        Ok(())
    }

    /// Normalizes and validates a draft against the cached subcategories.
    fn prepare(&self, mut draft: ListingDraft) -> Result<ListingDraft> {
        normalize(&mut draft);
        let known = draft.category_id.and_then(|category| {
            self.state()
                .subcategories
                .get(&category)
                .filter(|slot| slot.entry.error.is_none())
                .and_then(|slot| slot.entry.data.clone())
        });
        validate_listing(&draft, known.as_deref()).map_err(Error::Validation)?;
        Ok(draft)
    }

    fn seed_detail(&self, listing: &Listing) {
        {
            let mut guard = self.state();
            let generation = guard.next_generation();
            let slot = guard.details.entry(listing.id).or_default();
            slot.begin(generation);
            slot.apply(generation, Ok(listing.clone()));
        }
        self.publish(CacheKey::ListingDetail(listing.id));
    }

    /// Creates a listing and refreshes the collections it appears in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid draft, or the API error.
    pub async fn create_listing(&self, draft: ListingDraft) -> Result<Listing> {
        let draft = self.prepare(draft)?;
        let listing = self.api.create_listing(&draft).await?;
        info!("Created listing {}", listing.id);
        self.seed_detail(&listing);
        self.dispatch(&Trigger::ListingCreated).await;
        Ok(listing)
    }

    /// Updates a listing, replacing its cached detail with the server's copy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid draft, or the API error;
    /// on failure the cached detail is unchanged.
    pub async fn update_listing(&self, id: ListingId, draft: ListingDraft) -> Result<Listing> {
        let draft = self.prepare(draft)?;
        let listing = self.api.update_listing(id, &draft).await?;
        info!("Updated listing {id}");
        self.seed_detail(&listing);
        self.dispatch(&Trigger::ListingUpdated).await;
        Ok(listing)
    }

    /// Deletes a listing and drops it from every cached collection.
    ///
    /// Collection requests in flight when the delete succeeds are superseded,
    /// since their responses may still contain the listing. The listings page
    /// cursor is kept, so the next page call retries a superseded page.
    ///
    /// # Errors
    ///
    /// Returns the API error; nothing is removed locally on failure.
    pub async fn delete_listing(&self, id: ListingId) -> Result<()> {
        self.api.delete_listing(id).await?;
        info!("Deleted listing {id}");

        let mut changed = vec![CacheKey::ListingDetail(id)];
        {
            let mut guard = self.state();
            let generation = guard.next_generation();
            let state = &mut *guard;
            let superseded = state.listings.slot.supersede(generation);
            if remove_listing(state.listings.slot.entry.data.as_mut(), id) || superseded {
                changed.push(CacheKey::Listings);
            }
            let superseded = state.favorites.supersede(generation);
            if remove_listing(state.favorites.entry.data.as_mut(), id) || superseded {
                changed.push(CacheKey::Favorites);
            }
            let superseded = state.my_listings.supersede(generation);
            if remove_listing(state.my_listings.entry.data.as_mut(), id) || superseded {
                changed.push(CacheKey::MyListings);
            }
            for (username, slot) in &mut state.user_listings {
                let superseded = slot.supersede(generation);
                if remove_listing(slot.entry.data.as_mut(), id) || superseded {
                    changed.push(CacheKey::UserListings(username.clone()));
                }
            }
            if let Some(slot) = state.details.get_mut(&id) {
                slot.clear(generation);
            }
        }
        for key in changed {
            self.publish(key);
        }
        Ok(())
    }

    /// Refetches a key without clearing it first.
    async fn refresh(&self, key: &CacheKey) {
        let result = match key {
            CacheKey::Listings => {
                let filters = self.state().listings.filters.clone();
                self.fetch_listings(true, &filters).await
            }
            CacheKey::Categories => self.fetch_categories().await,
            CacheKey::Subcategories(id) => self.fetch_subcategories(Some(*id)).await,
            CacheKey::Favorites => self.fetch_favorites().await,
            CacheKey::MyListings => self.fetch_my_listings().await,
            CacheKey::ListingDetail(id) => self.fetch_listing(*id).await.map(|_| ()),
            CacheKey::Profile(username) => self.fetch_profile(username).await,
            CacheKey::UserListings(username) => self.fetch_user_listings(username).await,
        };
        if let Err(e) = result {
            debug!("Refresh of {key} failed: {e}");
        }
    }

    /// Refetches every key the trigger depends on.
    pub async fn dispatch(&self, trigger: &Trigger) {
        debug!("Dispatching {trigger:?}");
        for key in trigger.keys() {
            self.refresh(&key).await;
        }
    }

    /// Clears a key, supersedes its in-flight request and refetches it.
    ///
    /// # Errors
    ///
    /// Refetch failures are recorded on the key; this returns `Ok`.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<()> {
        debug!("Invalidating {key}");
        {
            let mut guard = self.state();
            let generation = guard.next_generation();
            let state = &mut *guard;
            match key {
                CacheKey::Listings => {
                    state.listings.slot.clear(generation);
                    state.listings.page = 0;
                    state.listings.has_more = true;
                }
                CacheKey::Categories => state.categories.clear(generation),
                CacheKey::Subcategories(id) => {
                    state.subcategories.entry(*id).or_default().clear(generation);
                }
                CacheKey::Favorites => state.favorites.clear(generation),
                CacheKey::MyListings => state.my_listings.clear(generation),
                CacheKey::ListingDetail(id) => {
                    state.details.entry(*id).or_default().clear(generation);
                }
                CacheKey::Profile(username) => {
                    state
                        .profiles
                        .entry(username.clone())
                        .or_default()
                        .clear(generation);
                }
                CacheKey::UserListings(username) => {
                    state
                        .user_listings
                        .entry(username.clone())
                        .or_default()
                        .clear(generation);
                }
            }
        }
        self.publish(key.clone());
        self.refresh(key).await;
        Ok(())
    }

    /// Invalidates a key given in its string form.
    ///
    /// Accepts the [`CacheKey`] display form as well as `listing-{id}` and
    /// `subcategories-{categoryId}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCacheKey`] if the string names no key.
    pub async fn invalidate_str(&self, key: &str) -> Result<()> {
        let key: CacheKey = key.parse()?;
        self.invalidate(&key).await
    }

    /// Optimistically sets a listing's favorite state in every cached copy.
    pub fn update_favorite_status(&self, id: ListingId, is_favorited: bool) {
        let changed = self.state().set_favorited(id, is_favorited);
        for key in changed {
            self.publish(key);
        }
    }

    /// Whether the listing is favorited according to the cache.
    #[must_use]
    pub fn is_favorited(&self, id: ListingId) -> bool {
        let state = self.state();
        state.find_listing(id).is_some_and(|l| l.is_favorited)
            || state
                .favorites
                .entry
                .data
                .as_ref()
                .is_some_and(|favorites| favorites.iter().any(|l| l.id == id))
    }

    /// Flips a listing's favorite state.
    ///
    /// The flip is applied locally first, then reconciled with the server's
    /// answer and a fresh favorites fetch. On failure the flip is reverted.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn toggle_favorite(&self, id: ListingId) -> Result<bool> {
        let was_favorited = self.is_favorited(id);
        self.update_favorite_status(id, !was_favorited);

        match self.api.toggle_favorite(id).await {
            Ok(is_favorited) => {
                self.update_favorite_status(id, is_favorited);
                self.dispatch(&Trigger::FavoriteToggled).await;
                Ok(is_favorited)
            }
            Err(error) => {
                warn!("Failed to toggle favorite on listing {id}: {error}");
                self.update_favorite_status(id, was_favorited);
                Err(error.into())
            }
        }
    }

    /// Loads the initial data set; only the first call does anything.
    ///
    /// # Errors
    ///
    /// Failures are recorded on their keys; this returns `Ok`.
    pub async fn initialize(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Entity store already initialized");
            return Ok(());
        }
        info!("Initializing entity store");
        let filters = self.state().listings.filters.clone();
        let (categories, favorites, listings, my_listings) = tokio::join!(
            self.fetch_categories(),
            self.fetch_favorites(),
            self.fetch_listings(true, &filters),
            self.fetch_my_listings(),
        );
        categories?;
        favorites?;
        listings?;
        my_listings
    }

    /// Refreshes the data that depends on who is signed in.
    pub async fn on_login(&self) {
        self.dispatch(&Trigger::LoggedIn).await;
    }

    /// Drops user-scoped data and supersedes its in-flight requests.
    pub fn on_logout(&self) {
        let mut changed = vec![CacheKey::Favorites, CacheKey::MyListings];
        {
            let mut guard = self.state();
            let generation = guard.next_generation();
            let state = &mut *guard;
            state.favorites.clear(generation);
            state.my_listings.clear(generation);
            changed.extend(state.details.drain().map(|(id, _)| CacheKey::ListingDetail(id)));
            changed.extend(state.profiles.drain().map(|(name, _)| CacheKey::Profile(name)));
            changed.extend(
                state
                    .user_listings
                    .drain()
                    .map(|(name, _)| CacheKey::UserListings(name)),
            );

            let mut flags_cleared = false;
            for listing in state.listings.slot.entry.data.iter_mut().flatten() {
                if listing.is_favorited {
                    listing.is_favorited = false;
                    flags_cleared = true;
                }
            }
            if flags_cleared {
                changed.push(CacheKey::Listings);
            }
        }
        info!("Cleared user data from entity store");
        for key in changed {
            self.publish(key);
        }
    }

    /// Snapshot of the listings collection.
    #[must_use]
    pub fn listings(&self) -> CacheEntry<Vec<Listing>> {
        self.state().listings.slot.entry.clone()
    }

    /// Whether another listings page is available.
    #[must_use]
    pub fn has_more_listings(&self) -> bool {
        self.state().listings.has_more
    }

    /// Filters recorded by the latest listings reset.
    #[must_use]
    pub fn listing_filters(&self) -> FilterSet {
        self.state().listings.filters.clone()
    }

    /// Snapshot of the categories.
    #[must_use]
    pub fn categories(&self) -> CacheEntry<Vec<Category>> {
        self.state().categories.entry.clone()
    }

    /// Snapshot of a category's subcategories.
    #[must_use]
    pub fn subcategories(&self, category: CategoryId) -> CacheEntry<Vec<Subcategory>> {
        self.state()
            .subcategories
            .get(&category)
            .map(|slot| slot.entry.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the favorites.
    #[must_use]
    pub fn favorites(&self) -> CacheEntry<Vec<Listing>> {
        self.state().favorites.entry.clone()
    }

    /// Snapshot of the current user's listings.
    #[must_use]
    pub fn my_listings(&self) -> CacheEntry<Vec<Listing>> {
        self.state().my_listings.entry.clone()
    }

    /// Snapshot of a listing's detail record.
    #[must_use]
    pub fn listing(&self, id: ListingId) -> CacheEntry<Listing> {
        self.state()
            .details
            .get(&id)
            .map(|slot| slot.entry.clone())
            .unwrap_or_default()
    }

    /// Snapshot of a public profile.
    #[must_use]
    pub fn profile(&self, username: &str) -> CacheEntry<Profile> {
        self.state()
            .profiles
            .get(username)
            .map(|slot| slot.entry.clone())
            .unwrap_or_default()
    }

    /// Snapshot of a user's public listings.
    #[must_use]
    pub fn user_listings(&self, username: &str) -> CacheEntry<Vec<Listing>> {
        self.state()
            .user_listings
            .get(username)
            .map(|slot| slot.entry.clone())
            .unwrap_or_default()
    }
}
