//! Public user profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// A review left on a user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review id.
    pub id: i64,
    /// Who wrote the review.
    #[serde(alias = "reviewer")]
    pub reviewer_username: String,
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Review text.
    #[serde(default)]
    pub comment: String,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// User id.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Short biography.
    #[serde(default)]
    pub bio: String,
    /// Location text.
    #[serde(default)]
    pub location: Option<String>,
    /// Partial avatar path.
    #[serde(default)]
    pub avatar: Option<String>,
    /// When the user joined.
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
    /// Mean review rating.
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Reviews, newest first.
    #[serde(default)]
    pub reviews: Vec<Review>,
}
