//! Listing search filters.

use serde::{Deserialize, Serialize};

/// Filters applied to the listings collection.
///
/// Every field is free text as entered by the user; blank values are
/// dropped before they reach the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Category id.
    pub category: Option<String>,
    /// Subcategory id.
    pub subcategory: Option<String>,
    /// Minimum price.
    pub min_price: Option<String>,
    /// Maximum price.
    pub max_price: Option<String>,
    /// Item condition.
    pub condition: Option<String>,
    /// Delivery option.
    pub delivery_option: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
    /// Listing type.
    pub listing_type: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Sort order, e.g. `-created_at`.
    pub ordering: Option<String>,
}

impl FilterSet {
    fn entries(&self) -> [(&'static str, &Option<String>); 10] {
        [
            ("category", &self.category),
            ("subcategory", &self.subcategory),
            ("min_price", &self.min_price),
            ("max_price", &self.max_price),
            ("condition", &self.condition),
            ("delivery_option", &self.delivery_option),
            ("search", &self.search),
            ("listing_type", &self.listing_type),
            ("location", &self.location),
            ("ordering", &self.ordering),
        ]
    }

    /// Returns a copy with blank values removed and the rest trimmed.
    #[must_use]
    pub fn stripped(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            category: clean(&self.category),
            subcategory: clean(&self.subcategory),
            min_price: clean(&self.min_price),
            max_price: clean(&self.max_price),
            condition: clean(&self.condition),
            delivery_option: clean(&self.delivery_option),
            search: clean(&self.search),
            listing_type: clean(&self.listing_type),
            location: clean(&self.location),
            ordering: clean(&self.ordering),
        }
    }

    /// Whether no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query parameters for the non-blank filters.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.stripped()
            .entries()
            .into_iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
            .collect()
    }
}
