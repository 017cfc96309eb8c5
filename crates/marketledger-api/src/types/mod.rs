//! Wire types exchanged with the marketplace API.

mod catalog;
mod filters;
mod ids;
mod listing;
mod messaging;
mod page;
mod profile;

pub use catalog::{Category, Subcategory};
pub use filters::FilterSet;
pub use ids::{CategoryId, ConversationId, ImageId, ListingId, MessageId, SubcategoryId, UserId};
pub use listing::{
    Condition, DeliveryOption, Image, Listing, ListingDraft, ListingStatus, ListingType, NewImage,
    PriceType,
};
pub use messaging::{Conversation, LastMessage, ListingRef, Message, UserRef};
pub(crate) use page::Listed;
pub use page::Page;
pub use profile::{Profile, Review};
