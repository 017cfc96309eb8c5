//! Entity store behavior against a scripted backend.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeApi, listing, signed_in_session, signed_out_session, subcategory};
use marketledger_api::ErrorKind;
use marketledger_api::types::{
    CategoryId, Condition, FilterSet, ListingDraft, ListingId, ListingType, PriceType,
    SubcategoryId,
};
use marketledger_core::{CacheKey, EntityStore, Error, Trigger, ValidationError};
use proptest::prelude::*;
use tokio_test::{assert_err, assert_ok};

fn search(term: &str) -> FilterSet {
    FilterSet {
        search: Some(term.to_string()),
        ..FilterSet::default()
    }
}

fn titles(store: &EntityStore) -> Vec<String> {
    store
        .listings()
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|l| l.title)
        .collect()
}

fn valid_draft(title: &str) -> ListingDraft {
    let mut draft = ListingDraft::new(title, ListingType::ItemSale);
    draft.category_id = Some(CategoryId::new(1));
    draft.condition = Some(Condition::Good);
    draft.price = Some("20".to_string());
    draft.price_type = PriceType::Fixed;
    draft
}

#[tokio::test(start_paused = true)]
async fn test_latest_reset_wins_over_slower_earlier_reset() {
    let api = FakeApi::new();
    api.set_page("old", 1, vec![listing(1, "old")], false);
    api.set_page("new", 1, vec![listing(2, "new")], false);
    {
        let mut delays = api.page_delays.lock().unwrap();
        delays.insert("old".to_string(), Duration::from_millis(50));
        delays.insert("new".to_string(), Duration::from_millis(10));
    }
    let store = EntityStore::new(api.clone(), signed_out_session());

    let old_filters = search("old");
    let new_filters = search("new");
    let (first, second) = tokio::join!(
        store.fetch_listings(true, &old_filters),
        store.fetch_listings(true, &new_filters),
    );
    assert_ok!(first);
    assert_ok!(second);

    assert_eq!(titles(&store), vec!["new"]);
    assert_eq!(store.listing_filters().search.as_deref(), Some("new"));
    assert!(!store.listings().loading);
}

#[tokio::test]
async fn test_pages_append_until_exhausted() {
    let api = FakeApi::new();
    api.set_page("", 1, vec![listing(1, "a"), listing(2, "b")], true);
    api.set_page("", 2, vec![listing(2, "b"), listing(3, "c")], false);
    let store = EntityStore::new(api.clone(), signed_out_session());
    let filters = FilterSet::default();

    store.fetch_listings(true, &filters).await.unwrap();
    assert!(store.has_more_listings());
    store.fetch_listings(false, &filters).await.unwrap();

    assert_eq!(titles(&store), vec!["a", "b", "c"]);
    assert!(!store.has_more_listings());

    store.fetch_listings(false, &filters).await.unwrap();
    assert_eq!(api.calls("list_listings"), 2);
}

#[tokio::test]
async fn test_next_page_keeps_filters_of_last_reset() {
    let api = FakeApi::new();
    api.set_page("lamp", 1, vec![listing(1, "lamp 1")], true);
    api.set_page("lamp", 2, vec![listing(2, "lamp 2")], false);
    let store = EntityStore::new(api.clone(), signed_out_session());

    store.fetch_listings(true, &search("  lamp ")).await.unwrap();
    store.fetch_listings(false, &search("ignored")).await.unwrap();

    assert_eq!(titles(&store), vec!["lamp 1", "lamp 2"]);
}

#[tokio::test]
async fn test_failed_page_keeps_previous_items() {
    let api = FakeApi::new();
    api.set_page("", 1, vec![listing(1, "a")], true);
    let store = EntityStore::new(api.clone(), signed_out_session());

    store.fetch_listings(true, &FilterSet::default()).await.unwrap();
    api.fail("list_listings");
    store.fetch_listings(false, &FilterSet::default()).await.unwrap();

    let entry = store.listings();
    assert_eq!(titles(&store), vec!["a"]);
    assert_eq!(entry.error.map(|e| e.kind), Some(ErrorKind::ServerError));
    assert!(!entry.loading);
}

#[tokio::test]
async fn test_categories_fetched_once_until_invalidated() {
    let api = FakeApi::new();
    api.categories.lock().unwrap().push(marketledger_api::types::Category {
        id: CategoryId::new(1),
        name: "Furniture".to_string(),
    });
    let store = EntityStore::new(api.clone(), signed_out_session());

    store.fetch_categories().await.unwrap();
    store.fetch_categories().await.unwrap();
    assert_eq!(api.calls("categories"), 1);

    api.categories.lock().unwrap()[0].name = "Home".to_string();
    store.invalidate(&CacheKey::Categories).await.unwrap();

    assert_eq!(api.calls("categories"), 2);
    assert_eq!(store.categories().data.unwrap()[0].name, "Home");
}

#[tokio::test]
async fn test_subcategories_fetched_once_per_category() {
    let api = FakeApi::new();
    api.subcategories
        .lock()
        .unwrap()
        .insert(CategoryId::new(1), vec![subcategory(10, 1)]);
    let store = EntityStore::new(api.clone(), signed_out_session());

    store.fetch_subcategories(None).await.unwrap();
    assert_eq!(api.calls("subcategories"), 0);

    store.fetch_subcategories(Some(CategoryId::new(1))).await.unwrap();
    store.fetch_subcategories(Some(CategoryId::new(1))).await.unwrap();
    assert_eq!(api.calls("subcategories"), 1);
    assert_eq!(
        store.subcategories(CategoryId::new(1)).data.unwrap()[0].id,
        SubcategoryId::new(10)
    );
}

#[tokio::test]
async fn test_failed_subcategories_cache_empty_list() {
    let api = FakeApi::new();
    api.fail("subcategories");
    let store = EntityStore::new(api.clone(), signed_out_session());

    store.fetch_subcategories(Some(CategoryId::new(2))).await.unwrap();

    let entry = store.subcategories(CategoryId::new(2));
    assert_eq!(entry.data, Some(Vec::new()));
    assert!(entry.error.is_some());
}

#[tokio::test]
async fn test_delete_removes_listing_everywhere() {
    let api = FakeApi::new();
    let target = listing(5, "bike");
    api.set_page("", 1, vec![target.clone(), listing(6, "desk")], false);
    api.listings.lock().unwrap().insert(target.id, target.clone());
    api.favorites.lock().unwrap().push(target.clone());
    api.my_listings.lock().unwrap().push(target.clone());
    let store = EntityStore::new(api.clone(), signed_in_session());

    store.fetch_listings(true, &FilterSet::default()).await.unwrap();
    store.fetch_favorites().await.unwrap();
    store.fetch_my_listings().await.unwrap();
    store.fetch_listing(target.id).await.unwrap();

    store.delete_listing(target.id).await.unwrap();

    assert_eq!(titles(&store), vec!["desk"]);
    assert!(store.favorites().data.unwrap().is_empty());
    assert!(store.my_listings().data.unwrap().is_empty());
    assert!(store.listing(target.id).data.is_none());
}

#[tokio::test]
async fn test_failed_delete_keeps_cache() {
    let api = FakeApi::new();
    api.set_page("", 1, vec![listing(5, "bike")], false);
    api.fail("delete_listing");
    let store = EntityStore::new(api.clone(), signed_out_session());
    store.fetch_listings(true, &FilterSet::default()).await.unwrap();

    assert_err!(store.delete_listing(ListingId::new(5)).await);
    assert_eq!(titles(&store), vec!["bike"]);
}

#[tokio::test]
async fn test_invalidate_by_string_refetches_detail() {
    let api = FakeApi::new();
    api.listings
        .lock()
        .unwrap()
        .insert(ListingId::new(5), listing(5, "before"));
    let store = EntityStore::new(api.clone(), signed_out_session());
    store.fetch_listing(ListingId::new(5)).await.unwrap();

    api.listings
        .lock()
        .unwrap()
        .insert(ListingId::new(5), listing(5, "after"));
    store.invalidate_str("listing-5").await.unwrap();

    assert_eq!(store.listing(ListingId::new(5)).data.unwrap().title, "after");
    assert!(matches!(
        store.invalidate_str("orders").await,
        Err(Error::UnknownCacheKey(_))
    ));
}

#[tokio::test]
async fn test_fetch_listing_error_keeps_stale_detail() {
    let api = FakeApi::new();
    api.listings
        .lock()
        .unwrap()
        .insert(ListingId::new(5), listing(5, "bike"));
    let store = EntityStore::new(api.clone(), signed_out_session());
    store.fetch_listing(ListingId::new(5)).await.unwrap();

    api.fail("get_listing");
    let err = store.fetch_listing(ListingId::new(5)).await.unwrap_err();

    assert_eq!(err.as_api().map(|e| e.kind), Some(ErrorKind::ServerError));
    let entry = store.listing(ListingId::new(5));
    assert_eq!(entry.data.unwrap().title, "bike");
    assert!(entry.error.is_some());
}

#[tokio::test]
async fn test_free_item_is_sent_with_zero_price() {
    let api = FakeApi::new();
    let store = EntityStore::new(api.clone(), signed_in_session());
    let mut draft = valid_draft("Old sofa");
    draft.listing_type = ListingType::ItemFree;
    draft.price = Some("99".to_string());
    draft.price_type = PriceType::Negotiable;

    let created = store.create_listing(draft).await.unwrap();

    let sent = api.created_drafts.lock().unwrap()[0].clone();
    assert_eq!(sent.price.as_deref(), Some("0"));
    assert_eq!(sent.price_type, PriceType::Free);
    assert_eq!(store.listing(created.id).data.unwrap().title, "Old sofa");
    // listings and my listings are refreshed after a create
    assert_eq!(api.calls("list_listings"), 1);
    assert_eq!(api.calls("my_listings"), 1);
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_server() {
    let api = FakeApi::new();
    let store = EntityStore::new(api.clone(), signed_in_session());

    let err = store
        .create_listing(ListingDraft::new("  ", ListingType::Event))
        .await
        .unwrap_err();

    match err {
        Error::Validation(errors) => {
            assert!(errors.contains(&ValidationError::MissingTitle));
            assert!(errors.contains(&ValidationError::MissingEventDate));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(api.calls("create_listing"), 0);
}

#[tokio::test]
async fn test_draft_checked_against_cached_subcategories() {
    let api = FakeApi::new();
    api.subcategories
        .lock()
        .unwrap()
        .insert(CategoryId::new(1), vec![subcategory(10, 1)]);
    let store = EntityStore::new(api.clone(), signed_in_session());
    store.fetch_subcategories(Some(CategoryId::new(1))).await.unwrap();

    let mut draft = valid_draft("Chair");
    draft.subcategory_id = Some(SubcategoryId::new(99));

    assert!(matches!(
        store.create_listing(draft).await,
        Err(Error::Validation(errors)) if errors == vec![ValidationError::SubcategoryMismatch]
    ));
}

#[tokio::test]
async fn test_toggle_favorite_reconciles_with_server() {
    let api = FakeApi::new();
    let bike = listing(5, "bike");
    api.set_page("", 1, vec![bike.clone()], false);
    api.listings.lock().unwrap().insert(bike.id, bike.clone());
    let store = EntityStore::new(api.clone(), signed_in_session());
    store.fetch_listings(true, &FilterSet::default()).await.unwrap();
    store.fetch_favorites().await.unwrap();

    assert!(store.toggle_favorite(bike.id).await.unwrap());

    assert!(store.is_favorited(bike.id));
    assert!(store.listings().data.unwrap()[0].is_favorited);
    assert_eq!(store.favorites().data.unwrap().len(), 1);
    assert_eq!(api.calls("favorites"), 2);
}

#[tokio::test]
async fn test_toggle_favorite_reverts_on_failure() {
    let api = FakeApi::new();
    api.set_page("", 1, vec![listing(5, "bike")], false);
    api.fail("toggle_favorite");
    let store = EntityStore::new(api.clone(), signed_in_session());
    store.fetch_listings(true, &FilterSet::default()).await.unwrap();

    assert_err!(store.toggle_favorite(ListingId::new(5)).await);

    assert!(!store.is_favorited(ListingId::new(5)));
    assert!(!store.listings().data.unwrap()[0].is_favorited);
}

#[tokio::test]
async fn test_user_collections_skipped_when_signed_out() {
    let api = FakeApi::new();
    let store = EntityStore::new(api.clone(), signed_out_session());

    store.initialize().await.unwrap();
    store.initialize().await.unwrap();

    assert_eq!(api.calls("favorites"), 0);
    assert_eq!(api.calls("my_listings"), 0);
    assert_eq!(api.calls("categories"), 1);
    assert_eq!(api.calls("list_listings"), 1);
}

#[tokio::test]
async fn test_logout_clears_user_data() {
    let api = FakeApi::new();
    let mut favorite = listing(5, "bike");
    favorite.is_favorited = true;
    api.set_page("", 1, vec![favorite.clone()], false);
    api.favorites.lock().unwrap().push(favorite.clone());
    api.my_listings.lock().unwrap().push(listing(6, "mine"));
    let store = EntityStore::new(api.clone(), signed_in_session());
    store.initialize().await.unwrap();
    let mut events = store.subscribe();

    store.on_logout();

    assert!(store.favorites().data.is_none());
    assert!(store.my_listings().data.is_none());
    assert!(!store.listings().data.unwrap()[0].is_favorited);
    let mut changed = Vec::new();
    while let Ok(key) = events.try_recv() {
        changed.push(key);
    }
    assert!(changed.contains(&CacheKey::Favorites));
    assert!(changed.contains(&CacheKey::Listings));
}

#[tokio::test]
async fn test_profile_trigger_refetches_profile_and_listings() {
    let api = FakeApi::new();
    let store = EntityStore::new(api.clone(), signed_in_session());

    store
        .dispatch(&Trigger::ProfileUpdated("ana".to_string()))
        .await;

    assert_eq!(api.calls("profile"), 1);
    assert_eq!(api.calls("user_listings"), 1);
    // unknown profile is recorded as an error on its key
    assert_eq!(
        store.profile("ana").error.map(|e| e.kind),
        Some(ErrorKind::NotFound)
    );
}

#[tokio::test(start_paused = true)]
async fn test_next_page_is_noop_while_loading() {
    let api = FakeApi::new();
    api.set_page("", 1, vec![listing(1, "a")], true);
    api.page_delays
        .lock()
        .unwrap()
        .insert(String::new(), Duration::from_millis(50));
    let store = EntityStore::new(api.clone(), signed_out_session());
    let filters = FilterSet::default();

    let (first, second) = tokio::join!(
        store.fetch_listings(true, &filters),
        store.fetch_listings(false, &filters),
    );
    assert_ok!(first);
    assert_ok!(second);

    assert_eq!(api.calls("list_listings"), 1);
    assert_eq!(titles(&store), vec!["a"]);
    assert!(store.has_more_listings());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_category_fetches_share_one_request() {
    let api = FakeApi::new();
    api.categories.lock().unwrap().push(marketledger_api::types::Category {
        id: CategoryId::new(1),
        name: "Furniture".to_string(),
    });
    api.delay("categories", Duration::from_millis(50));
    let store = EntityStore::new(api.clone(), signed_out_session());

    let (first, second) = tokio::join!(store.fetch_categories(), store.fetch_categories());
    assert_ok!(first);
    assert_ok!(second);

    assert_eq!(api.calls("categories"), 1);
    assert_eq!(store.categories().data.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_supersedes_collections_in_flight() {
    let api = FakeApi::new();
    let target = listing(5, "bike");
    api.set_page("", 1, vec![listing(1, "lamp")], true);
    api.set_page("", 2, vec![target.clone()], false);
    api.favorites.lock().unwrap().push(target.clone());
    let store = EntityStore::new(api.clone(), signed_in_session());
    let filters = FilterSet::default();
    store.fetch_listings(true, &filters).await.unwrap();
    store.fetch_favorites().await.unwrap();
    api.page_delays
        .lock()
        .unwrap()
        .insert(String::new(), Duration::from_millis(50));
    api.delay("favorites", Duration::from_millis(50));

    let (page, favorites, deleted) = tokio::join!(
        store.fetch_listings(false, &filters),
        store.fetch_favorites(),
        store.delete_listing(target.id),
    );
    assert_ok!(page);
    assert_ok!(favorites);
    assert_ok!(deleted);

    assert_eq!(titles(&store), vec!["lamp"]);
    assert!(!store.listings().loading);
    assert!(store.has_more_listings());
    assert!(store.favorites().data.unwrap().is_empty());
    assert!(!store.favorites().loading);

    // the superseded page is requested again
    api.set_page("", 2, vec![listing(6, "desk")], false);
    store.fetch_listings(false, &filters).await.unwrap();
    assert_eq!(titles(&store), vec!["lamp", "desk"]);
    assert_eq!(api.calls("list_listings"), 3);
}

#[tokio::test]
async fn test_update_replaces_detail_and_refreshes_collections() {
    let api = FakeApi::new();
    let target = listing(5, "bike");
    api.listings.lock().unwrap().insert(target.id, target.clone());
    let store = EntityStore::new(api.clone(), signed_in_session());
    store.fetch_listing(target.id).await.unwrap();

    let updated = store
        .update_listing(target.id, valid_draft("red bike"))
        .await
        .unwrap();

    assert_eq!(updated.title, "red bike");
    assert_eq!(store.listing(target.id).data.unwrap().title, "red bike");
    assert_eq!(api.calls("list_listings"), 1);
    assert_eq!(api.calls("my_listings"), 1);
}

#[tokio::test]
async fn test_failed_update_keeps_detail() {
    let api = FakeApi::new();
    let target = listing(5, "bike");
    api.listings.lock().unwrap().insert(target.id, target.clone());
    api.fail("update_listing");
    let store = EntityStore::new(api.clone(), signed_in_session());
    store.fetch_listing(target.id).await.unwrap();

    assert_err!(store.update_listing(target.id, valid_draft("red bike")).await);

    let detail = store.listing(target.id);
    assert_eq!(detail.data.unwrap().title, "bike");
    assert!(detail.error.is_none());
    assert_eq!(api.calls("list_listings"), 0);
    assert_eq!(api.calls("my_listings"), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_last_reset_wins(delays in prop::collection::vec(0_u64..50, 1..6)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let shown = runtime.block_on(async {
            let api = FakeApi::new();
            for (i, delay) in delays.iter().enumerate() {
                let term = format!("q{i}");
                let id = i64::try_from(i).unwrap() + 1;
                api.set_page(&term, 1, vec![listing(id, &term)], false);
                api.page_delays
                    .lock()
                    .unwrap()
                    .insert(term, Duration::from_millis(*delay));
            }
            let store = Arc::new(EntityStore::new(api, signed_out_session()));

            let mut handles = Vec::new();
            for i in 0..delays.len() {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    store.fetch_listings(true, &search(&format!("q{i}"))).await
                }));
                tokio::task::yield_now().await;
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
            titles(&store)
        });

        prop_assert_eq!(shown, vec![format!("q{}", delays.len() - 1)]);
    }
}
