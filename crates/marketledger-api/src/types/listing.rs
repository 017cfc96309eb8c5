//! Listing wire types and the submission draft.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ImageId, ListingId, SubcategoryId};
use crate::client::{FilePart, MultipartBody};

/// Kind of listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    /// Item for sale.
    ItemSale,
    /// Item given away.
    ItemFree,
    /// Item wanted.
    ItemWanted,
    /// Service offered.
    Service,
    /// Job posting.
    Job,
    /// Housing.
    Housing,
    /// Event.
    Event,
    /// Anything else.
    Other,
}

impl ListingType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ItemSale => "item_sale",
            Self::ItemFree => "item_free",
            Self::ItemWanted => "item_wanted",
            Self::Service => "service",
            Self::Job => "job",
            Self::Housing => "housing",
            Self::Event => "event",
            Self::Other => "other",
        }
    }

    /// Whether this is a physical item (and so carries a condition).
    #[must_use]
    pub const fn is_item(self) -> bool {
        matches!(self, Self::ItemSale | Self::ItemFree | Self::ItemWanted)
    }
}

/// How the price is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Fixed price.
    Fixed,
    /// Open to offers.
    Negotiable,
    /// No charge.
    Free,
    /// Contact the owner.
    Contact,
    /// Not applicable.
    #[default]
    Na,
}

impl PriceType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Negotiable => "negotiable",
            Self::Free => "free",
            Self::Contact => "contact",
            Self::Na => "na",
        }
    }

    /// Whether a numeric price must accompany this price type.
    #[must_use]
    pub const fn requires_amount(self) -> bool {
        matches!(self, Self::Fixed | Self::Negotiable)
    }
}

/// Item condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Brand new.
    New,
    /// Used but like new.
    LikeNew,
    /// Good.
    Good,
    /// Fair.
    Fair,
    /// Poor.
    Poor,
}

impl Condition {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::LikeNew => "like_new",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

/// How the item changes hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOption {
    /// Buyer picks up.
    Pickup,
    /// Owner delivers.
    Delivery,
    /// Either.
    Both,
    /// Not applicable.
    #[default]
    Na,
}

impl DeliveryOption {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
            Self::Both => "both",
            Self::Na => "na",
        }
    }
}

/// Listing lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Visible and open.
    #[default]
    Active,
    /// Hidden by the owner.
    Inactive,
    /// Sold.
    Sold,
    /// Expired.
    Expired,
    /// A status this client does not know.
    #[serde(other)]
    Other,
}

/// An image attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image id.
    pub id: ImageId,
    /// Partial path on the media host.
    #[serde(alias = "image")]
    pub path: String,
}

/// A marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing id.
    pub id: ListingId,
    /// Title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Listing kind.
    pub listing_type: ListingType,
    /// Decimal price as sent by the server.
    #[serde(default)]
    pub price: Option<String>,
    /// Price interpretation.
    #[serde(default)]
    pub price_type: PriceType,
    /// Condition, for items only.
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Category.
    #[serde(alias = "category")]
    pub category_id: CategoryId,
    /// Subcategory within the category.
    #[serde(default, alias = "subcategory")]
    pub subcategory_id: Option<SubcategoryId>,
    /// Hand-over option.
    #[serde(default)]
    pub delivery_option: DeliveryOption,
    /// Location text.
    #[serde(default)]
    pub location: Option<String>,
    /// Event date, for events only.
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ListingStatus,
    /// Username of the owner.
    #[serde(default, alias = "owner")]
    pub owner_username: String,
    /// Images in display order.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Number of users who favorited this listing.
    #[serde(default)]
    pub favorite_count: u32,
    /// Number of views.
    #[serde(default)]
    pub view_count: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the current user has favorited this listing.
    #[serde(default)]
    pub is_favorited: bool,
}

/// An image not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    /// File name as uploaded.
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
    /// Raw bytes.
    pub data: Bytes,
}

/// Fields submitted when creating or editing a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Listing kind.
    pub listing_type: ListingType,
    /// Decimal price.
    pub price: Option<String>,
    /// Price interpretation.
    pub price_type: PriceType,
    /// Condition, for items.
    pub condition: Option<Condition>,
    /// Category; `None` until the user picks one.
    pub category_id: Option<CategoryId>,
    /// Subcategory.
    pub subcategory_id: Option<SubcategoryId>,
    /// Hand-over option.
    pub delivery_option: DeliveryOption,
    /// Location text.
    pub location: Option<String>,
    /// Event date, for events.
    pub event_date: Option<DateTime<Utc>>,
    /// Images to upload.
    pub new_images: Vec<NewImage>,
    /// Existing images to remove.
    pub removed_image_ids: Vec<ImageId>,
}

impl ListingDraft {
    /// Creates a draft with the given title and type and nothing else set.
    #[must_use]
    pub fn new(title: impl Into<String>, listing_type: ListingType) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            listing_type,
            price: None,
            price_type: PriceType::Na,
            condition: None,
            category_id: None,
            subcategory_id: None,
            delivery_option: DeliveryOption::Na,
            location: None,
            event_date: None,
            new_images: Vec::new(),
            removed_image_ids: Vec::new(),
        }
    }

    /// Creates an edit draft pre-filled from an existing listing.
    #[must_use]
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            listing_type: listing.listing_type,
            price: listing.price.clone(),
            price_type: listing.price_type,
            condition: listing.condition,
            category_id: Some(listing.category_id),
            subcategory_id: listing.subcategory_id,
            delivery_option: listing.delivery_option,
            location: listing.location.clone(),
            event_date: listing.event_date,
            new_images: Vec::new(),
            removed_image_ids: Vec::new(),
        }
    }

    /// Encodes the draft as a multipart form body.
    #[must_use]
    pub fn to_multipart(&self) -> MultipartBody {
        let mut body = MultipartBody::new()
            .text("title", self.title.trim())
            .text("description", &self.description)
            .text("listing_type", self.listing_type.as_str())
            .text("price_type", self.price_type.as_str())
            .text("delivery_option", self.delivery_option.as_str());

        if let Some(price) = &self.price {
            body = body.text("price", price);
        }
        if let Some(condition) = self.condition {
            body = body.text("condition", condition.as_str());
        }
        if let Some(category) = self.category_id {
            body = body.text("category", category.to_string());
        }
        if let Some(subcategory) = self.subcategory_id {
            body = body.text("subcategory", subcategory.to_string());
        }
        if let Some(location) = &self.location {
            body = body.text("location", location);
        }
        if let Some(date) = self.event_date {
            body = body.text("event_date", date.to_rfc3339());
        }
        for id in &self.removed_image_ids {
            body = body.text("remove_images", id.to_string());
        }
        for image in &self.new_images {
            body = body.file(FilePart {
                field: "images".to_string(),
                file_name: image.file_name.clone(),
                content_type: image.content_type.clone(),
                data: image.data.clone(),
            });
        }
        body
    }
}
