//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, StoreId, UserId};

use super::rating::RatingSummary;

/// A store record as persisted (domain type).
///
/// Aggregate rating fields are deliberately absent here: they are derived
/// from the ratings table on every read, never stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Store name.
    pub name: String,
    /// Unique contact email.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Owning user, if any. Cleared when the owner account is deleted.
    pub owner_id: Option<UserId>,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A store joined with its owner's name and recomputed rating aggregate.
///
/// This is the shape returned to clients for store reads and listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoreWithRating {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: String,
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreWithRating {
    /// Compose a view from a store record, its owner's name, and a summary.
    #[must_use]
    pub fn compose(store: Store, owner_name: Option<String>, summary: RatingSummary) -> Self {
        Self {
            id: store.id,
            name: store.name,
            email: store.email,
            address: store.address,
            owner_id: store.owner_id,
            owner_name,
            average_rating: summary.average_rating,
            total_ratings: summary.total_ratings,
            created_at: store.created_at,
            updated_at: store.updated_at,
        }
    }
}

/// Fields for inserting a new store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub owner_id: UserId,
}

/// The non-empty diff applied by the store update policy.
///
/// Only fields that actually change are `Some`; no-op fields have already
/// been dropped by the policy before this reaches the gateway.
#[derive(Debug, Clone, Default)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

impl StoreChanges {
    /// True when no field changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.owner_id.is_none()
    }
}
