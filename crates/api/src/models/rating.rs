//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{RatingId, RatingValue, StoreId, UserId};

/// A single user's rating of a single store.
///
/// At most one row exists per (user, store) pair; resubmissions overwrite
/// the value in place and keep the id.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rating joined with the rated store, for a user's own rating list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RatingWithStore {
    pub id: RatingId,
    pub store_id: StoreId,
    pub rating: RatingValue,
    pub store_name: String,
    pub store_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rating joined with the rating user, for the store owner dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RatingWithUser {
    pub id: RatingId,
    pub user_id: UserId,
    pub rating: RatingValue,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

/// Derived aggregate over a store's ratings.
///
/// `average_rating` is 0 when the store has no ratings.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: i64,
}

impl RatingSummary {
    /// Summary for a store with no ratings.
    pub const EMPTY: Self = Self {
        average_rating: 0.0,
        total_ratings: 0,
    };

    /// Compute a summary from raw rating values.
    #[must_use]
    pub fn from_values(values: &[i32]) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }
        let total = values.len() as i64;
        let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
        #[allow(clippy::cast_precision_loss)]
        Self {
            average_rating: sum as f64 / total as f64,
            total_ratings: total,
        }
    }
}
