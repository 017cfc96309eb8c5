//! Listing draft validation.

use marketledger_api::types::{ListingDraft, ListingType, PriceType, Subcategory};

/// Validation error for a listing draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty.
    MissingTitle,
    /// No category selected.
    MissingCategory,
    /// Item listing without a condition.
    MissingCondition,
    /// Event listing without a date.
    MissingEventDate,
    /// Subcategory does not belong to the selected category.
    SubcategoryMismatch,
    /// Fixed or negotiable price without an amount.
    MissingPrice,
    /// Price is not a non-negative decimal.
    InvalidPrice,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::MissingTitle => "Title is required",
            Self::MissingCategory => "Category is required",
            Self::MissingCondition => "Condition is required for items",
            Self::MissingEventDate => "Event date is required for events",
            Self::SubcategoryMismatch => "Subcategory does not belong to the selected category",
            Self::MissingPrice => "Price is required",
            Self::InvalidPrice => "Price must be an amount like 12 or 12.50",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingTitle => "title",
            Self::MissingCategory => "category",
            Self::MissingCondition => "condition",
            Self::MissingEventDate => "event_date",
            Self::SubcategoryMismatch => "subcategory",
            Self::MissingPrice | Self::InvalidPrice => "price",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a listing draft.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Applies the field rules implied by the listing type.
///
/// Free items always carry price `"0"` with price type `free`; condition is
/// dropped for non-items and the event date for non-events.
pub fn normalize(draft: &mut ListingDraft) {
    if draft.listing_type == ListingType::ItemFree {
        draft.price = Some("0".to_string());
        draft.price_type = PriceType::Free;
    }
    if !draft.listing_type.is_item() {
        draft.condition = None;
    }
    if draft.listing_type != ListingType::Event {
        draft.event_date = None;
    }
    if draft
        .price
        .as_deref()
        .is_some_and(|price| price.trim().is_empty())
    {
        draft.price = None;
    }
}

/// Validate a listing draft.
///
/// `subcategories` is the known subcategory list for the draft's category;
/// when it is `None` the membership check is left to the server.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_listing(
    draft: &ListingDraft,
    subcategories: Option<&[Subcategory]>,
) -> ValidationResult {
    let mut errors = Vec::new();

    if draft.title.trim().is_empty() {
        errors.push(ValidationError::MissingTitle);
    }

    match draft.category_id {
        None => errors.push(ValidationError::MissingCategory),
        Some(category) => {
            if let (Some(subcategory), Some(known)) = (draft.subcategory_id, subcategories) {
                let belongs = known
                    .iter()
                    .any(|s| s.id == subcategory && s.category_id == category);
                if !belongs {
                    errors.push(ValidationError::SubcategoryMismatch);
                }
            }
        }
    }

    if draft.listing_type.is_item() && draft.condition.is_none() {
        errors.push(ValidationError::MissingCondition);
    }

    if draft.listing_type == ListingType::Event && draft.event_date.is_none() {
        errors.push(ValidationError::MissingEventDate);
    }

    if draft.price_type.requires_amount() {
        match draft.price.as_deref().map(str::trim) {
            None | Some("") => errors.push(ValidationError::MissingPrice),
            Some(price) if !is_valid_price(price) => errors.push(ValidationError::InvalidPrice),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Decimal with at most two fraction digits, e.g. `12`, `12.5`, `12.50`.
fn is_valid_price(price: &str) -> bool {
    let (whole, fraction) = price.split_once('.').unwrap_or((price, ""));
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.len() <= 2
        && fraction.bytes().all(|b| b.is_ascii_digit())
        && !(price.contains('.') && fraction.is_empty())
}
