//! Typed marketplace endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use url::form_urlencoded;

use crate::client::{ApiClient, RequestBody};
use crate::error::ApiResult;
use crate::types::{
    Category, CategoryId, Conversation, ConversationId, FilterSet, Listed, Listing, ListingDraft,
    ListingId, Message, MessageId, Page, Profile, Subcategory,
};

/// Remote marketplace operations.
///
/// The stores hold an `Arc<dyn MarketApi>` so tests can substitute a fake.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Fetches one page of listings matching the filters.
    async fn list_listings(&self, page: u32, filters: &FilterSet) -> ApiResult<Page<Listing>>;

    /// Fetches a single listing.
    async fn get_listing(&self, id: ListingId) -> ApiResult<Listing>;

    /// Creates a listing.
    async fn create_listing(&self, draft: &ListingDraft) -> ApiResult<Listing>;

    /// Replaces a listing's fields.
    async fn update_listing(&self, id: ListingId, draft: &ListingDraft) -> ApiResult<Listing>;

    /// Deletes a listing.
    async fn delete_listing(&self, id: ListingId) -> ApiResult<()>;

    /// Flips favorite membership; returns the new state.
    async fn toggle_favorite(&self, id: ListingId) -> ApiResult<bool>;

    /// Fetches all categories.
    async fn categories(&self) -> ApiResult<Vec<Category>>;

    /// Fetches the subcategories of a category.
    async fn subcategories(&self, category: CategoryId) -> ApiResult<Vec<Subcategory>>;

    /// Fetches the current user's favorites.
    async fn favorites(&self) -> ApiResult<Vec<Listing>>;

    /// Fetches the current user's own listings.
    async fn my_listings(&self) -> ApiResult<Vec<Listing>>;

    /// Fetches a public profile.
    async fn profile(&self, username: &str) -> ApiResult<Profile>;

    /// Fetches a user's public listings.
    async fn user_listings(&self, username: &str) -> ApiResult<Vec<Listing>>;

    /// Fetches the current user's conversations.
    async fn conversations(&self) -> ApiResult<Vec<Conversation>>;

    /// Starts (or returns the existing) conversation about a listing.
    async fn create_conversation(&self, listing: ListingId) -> ApiResult<Conversation>;

    /// Fetches the messages of a conversation.
    async fn messages(&self, conversation: ConversationId) -> ApiResult<Vec<Message>>;

    /// Sends a message.
    async fn send_message(&self, conversation: ConversationId, content: &str)
    -> ApiResult<Message>;

    /// Marks messages as read.
    async fn mark_as_read(&self, conversation: ConversationId, ids: &[MessageId])
    -> ApiResult<()>;

    /// Fetches the total unread count.
    async fn unread_count(&self) -> ApiResult<u32>;

    /// Fetches unread counts per conversation.
    async fn conversation_unread_counts(&self) -> ApiResult<HashMap<ConversationId, u32>>;
}

#[derive(Deserialize)]
struct FavoriteResponse {
    is_favorited: bool,
}

#[derive(Deserialize)]
struct UnreadResponse {
    unread_count: u32,
}

/// Percent-encodes a value for use as one path segment.
fn segment(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[async_trait]
impl MarketApi for ApiClient {
    async fn list_listings(&self, page: u32, filters: &FilterSet) -> ApiResult<Page<Listing>> {
        let mut query = vec![("page", page.to_string())];
        query.extend(filters.query_pairs());
        self.request_json(Method::GET, "listings/", RequestBody::Empty, &query)
            .await
    }

    async fn get_listing(&self, id: ListingId) -> ApiResult<Listing> {
        self.request_json(Method::GET, &format!("listings/{id}/"), RequestBody::Empty, &[])
            .await
    }

    async fn create_listing(&self, draft: &ListingDraft) -> ApiResult<Listing> {
        let body = RequestBody::Multipart(draft.to_multipart());
        self.request_json(Method::POST, "listings/", body, &[]).await
    }

    async fn update_listing(&self, id: ListingId, draft: &ListingDraft) -> ApiResult<Listing> {
        let body = RequestBody::Multipart(draft.to_multipart());
        self.request_json(Method::PUT, &format!("listings/{id}/"), body, &[])
            .await
    }

    async fn delete_listing(&self, id: ListingId) -> ApiResult<()> {
        self.request(Method::DELETE, &format!("listings/{id}/"), RequestBody::Empty, &[])
            .await?;
        Ok(())
    }

    async fn toggle_favorite(&self, id: ListingId) -> ApiResult<bool> {
        let response: FavoriteResponse = self
            .request_json(
                Method::POST,
                &format!("listings/{id}/favorite/"),
                RequestBody::Empty,
                &[],
            )
            .await?;
        Ok(response.is_favorited)
    }

    async fn categories(&self) -> ApiResult<Vec<Category>> {
        let listed: Listed<Category> = self
            .request_json(Method::GET, "categories/", RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn subcategories(&self, category: CategoryId) -> ApiResult<Vec<Subcategory>> {
        let path = format!("subcategories/by-category/{category}/");
        let listed: Listed<Subcategory> = self
            .request_json(Method::GET, &path, RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn favorites(&self) -> ApiResult<Vec<Listing>> {
        let listed: Listed<Listing> = self
            .request_json(Method::GET, "favorites/", RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn my_listings(&self) -> ApiResult<Vec<Listing>> {
        let listed: Listed<Listing> = self
            .request_json(Method::GET, "my-listings/", RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn profile(&self, username: &str) -> ApiResult<Profile> {
        let path = format!("profiles/{}/", segment(username));
        self.request_json(Method::GET, &path, RequestBody::Empty, &[])
            .await
    }

    async fn user_listings(&self, username: &str) -> ApiResult<Vec<Listing>> {
        let path = format!("listings/user/{}/", segment(username));
        let listed: Listed<Listing> = self
            .request_json(Method::GET, &path, RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn conversations(&self) -> ApiResult<Vec<Conversation>> {
        let listed: Listed<Conversation> = self
            .request_json(Method::GET, "conversations/", RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn create_conversation(&self, listing: ListingId) -> ApiResult<Conversation> {
        let body = RequestBody::Json(json!({ "listing_id": listing }));
        self.request_json(Method::POST, "conversations/", body, &[])
            .await
    }

    async fn messages(&self, conversation: ConversationId) -> ApiResult<Vec<Message>> {
        let path = format!("conversations/{conversation}/messages/");
        let listed: Listed<Message> = self
            .request_json(Method::GET, &path, RequestBody::Empty, &[])
            .await?;
        Ok(listed.into_vec())
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        content: &str,
    ) -> ApiResult<Message> {
        let path = format!("conversations/{conversation}/messages/");
        let body = RequestBody::Json(json!({ "content": content }));
        self.request_json(Method::POST, &path, body, &[]).await
    }

    async fn mark_as_read(
        &self,
        conversation: ConversationId,
        ids: &[MessageId],
    ) -> ApiResult<()> {
        let path = format!("conversations/{conversation}/mark-as-read/");
        let body = RequestBody::Json(json!({ "message_ids": ids }));
        self.request(Method::POST, &path, body, &[]).await?;
        Ok(())
    }

    async fn unread_count(&self) -> ApiResult<u32> {
        let response: UnreadResponse = self
            .request_json(Method::GET, "unread-messages/", RequestBody::Empty, &[])
            .await?;
        Ok(response.unread_count)
    }

    async fn conversation_unread_counts(&self) -> ApiResult<HashMap<ConversationId, u32>> {
        self.request_json(
            Method::GET,
            "conversation-unread-counts/",
            RequestBody::Empty,
            &[],
        )
        .await
    }
}
