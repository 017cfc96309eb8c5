//! Logical cache keys.

use std::fmt;
use std::str::FromStr;

use marketledger_api::types::{CategoryId, ListingId};

use crate::error::Error;

/// Identifies one cached collection or record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The paged, filtered listings collection.
    Listings,
    /// All categories.
    Categories,
    /// Subcategories of one category.
    Subcategories(CategoryId),
    /// Current user's favorites.
    Favorites,
    /// Current user's own listings.
    MyListings,
    /// One listing's detail record.
    ListingDetail(ListingId),
    /// A public profile.
    Profile(String),
    /// A user's public listings.
    UserListings(String),
}

impl CacheKey {
    /// Whether the key holds data tied to the signed-in user.
    #[must_use]
    pub const fn is_user_scoped(&self) -> bool {
        matches!(
            self,
            Self::Favorites
                | Self::MyListings
                | Self::ListingDetail(_)
                | Self::Profile(_)
                | Self::UserListings(_)
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listings => f.write_str("listings"),
            Self::Categories => f.write_str("categories"),
            Self::Subcategories(id) => write!(f, "subcategories:{id}"),
            Self::Favorites => f.write_str("favorites"),
            Self::MyListings => f.write_str("myListings"),
            Self::ListingDetail(id) => write!(f, "listingDetail:{id}"),
            Self::Profile(username) => write!(f, "profile:{username}"),
            Self::UserListings(username) => write!(f, "userListings:{username}"),
        }
    }
}

impl FromStr for CacheKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || Error::UnknownCacheKey(s.to_string());

        match s {
            "listings" => return Ok(Self::Listings),
            "categories" => return Ok(Self::Categories),
            "favorites" => return Ok(Self::Favorites),
            "myListings" => return Ok(Self::MyListings),
            _ => {}
        }

        let (prefix, rest) = s
            .split_once(':')
            .or_else(|| s.split_once('-'))
            .ok_or_else(unknown)?;
        if rest.is_empty() {
            return Err(unknown());
        }

        match prefix {
            "subcategories" => rest
                .parse()
                .map(Self::Subcategories)
                .map_err(|_| unknown()),
            "listingDetail" | "listing" => rest
                .parse()
                .map(Self::ListingDetail)
                .map_err(|_| unknown()),
            "profile" => Ok(Self::Profile(rest.to_string())),
            "userListings" => Ok(Self::UserListings(rest.to_string())),
            _ => Err(unknown()),
        }
    }
}
