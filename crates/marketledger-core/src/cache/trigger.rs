//! Follow-up invalidation table.

use super::key::CacheKey;

/// An event after which dependent cache keys must be refetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A user signed in.
    LoggedIn,
    /// The current user created a listing.
    ListingCreated,
    /// The current user edited a listing.
    ListingUpdated,
    /// A favorite was toggled.
    FavoriteToggled,
    /// A user's profile changed.
    ProfileUpdated(String),
}

impl Trigger {
    /// Keys to refetch after this trigger.
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        match self {
            Self::LoggedIn => vec![CacheKey::Favorites, CacheKey::MyListings],
            Self::ListingCreated | Self::ListingUpdated => {
                vec![CacheKey::Listings, CacheKey::MyListings]
            }
            Self::FavoriteToggled => vec![CacheKey::Favorites],
            Self::ProfileUpdated(username) => vec![
                CacheKey::Profile(username.clone()),
                CacheKey::UserListings(username.clone()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_mutations_refresh_collections() {
        for trigger in [Trigger::ListingCreated, Trigger::ListingUpdated] {
            assert_eq!(
                trigger.keys(),
                vec![CacheKey::Listings, CacheKey::MyListings]
            );
        }
    }

    #[test]
    fn test_login_refreshes_user_collections() {
        let keys = Trigger::LoggedIn.keys();
        assert!(keys.iter().all(CacheKey::is_user_scoped));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_profile_update_is_scoped_to_user() {
        assert_eq!(
            Trigger::ProfileUpdated("ana".to_string()).keys(),
            vec![
                CacheKey::Profile("ana".to_string()),
                CacheKey::UserListings("ana".to_string())
            ]
        );
    }
}
