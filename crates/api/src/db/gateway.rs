//! The persistence gateway trait.
//!
//! Policies receive a `&dyn Gateway` instead of reaching for a global pool,
//! so tests can substitute [`super::MemoryGateway`] for
//! [`super::PgGateway`].

use async_trait::async_trait;
use serde::Deserialize;

use store_ratings_core::{Email, RatingId, RatingValue, Role, StoreId, UserId};

use super::RepositoryError;
use crate::models::{
    NewStore, NewUser, Rating, RatingSummary, RatingWithStore, RatingWithUser, Store,
    StoreChanges, StoreWithRating, User,
};

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sortable columns for user listings.
///
/// A closed enum instead of a column-name whitelist: unknown sort keys fail
/// at deserialization, never at query build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortKey {
    Name,
    Email,
    Address,
    Role,
    CreatedAt,
}

impl UserSortKey {
    /// Column name in the users listing query.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Sortable columns for store listings, including the derived aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSortKey {
    Name,
    Email,
    Address,
    AverageRating,
    TotalRatings,
}

impl StoreSortKey {
    /// Column or alias name in the stores listing query.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::AverageRating => "average_rating",
            Self::TotalRatings => "total_ratings",
        }
    }
}

/// Filters for user listings. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub sort_by: Option<UserSortKey>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Filters for store listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub address: Option<String>,
    pub sort_by: Option<StoreSortKey>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Persistence operations over users, stores, and ratings.
///
/// Implementations provide per-statement atomicity only; the policies'
/// lookup-then-write sequences are not atomic and accept last-write-wins
/// races (low write concurrency domain).
#[async_trait]
pub trait Gateway: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    /// Find a user by ID.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Find a user by email.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user together with their password hash, for login.
    async fn user_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Insert a new user.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    async fn insert_user(&self, new_user: &NewUser) -> Result<User, RepositoryError>;

    /// Replace a user's password hash.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the user does not exist.
    async fn update_user_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// List users matching the filter.
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    /// Total number of users.
    async fn count_users(&self) -> Result<i64, RepositoryError>;

    // =========================================================================
    // Stores
    // =========================================================================

    /// Find a store record by ID (no aggregate).
    async fn find_store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Find the store owned by a user, if any.
    async fn find_store_by_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError>;

    /// Insert a new store.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    async fn insert_store(&self, new_store: &NewStore) -> Result<Store, RepositoryError>;

    /// Apply a field diff plus an updated timestamp to a store.
    ///
    /// Returns `true` if a row was updated.
    async fn update_store_fields(
        &self,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<bool, RepositoryError>;

    /// Whether another store already uses one of the given name/email values.
    ///
    /// `exclude` omits the store being updated from the check.
    async fn duplicate_store_exists(
        &self,
        name: Option<&str>,
        email: Option<&Email>,
        exclude: Option<StoreId>,
    ) -> Result<bool, RepositoryError>;

    /// List stores matching the filter, each with owner name and aggregate.
    async fn list_stores(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithRating>, RepositoryError>;

    /// Total number of stores.
    async fn count_stores(&self) -> Result<i64, RepositoryError>;

    // =========================================================================
    // Ratings
    // =========================================================================

    /// Find a user's rating of a store.
    async fn find_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// Insert a new rating row.
    async fn insert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError>;

    /// Overwrite an existing rating's value in place, preserving its id.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the rating does not exist.
    async fn update_rating_value(
        &self,
        id: RatingId,
        value: RatingValue,
    ) -> Result<(), RepositoryError>;

    /// Delete a user's rating of a store. Returns `true` if a row existed.
    async fn delete_rating(&self, user: UserId, store: StoreId)
    -> Result<bool, RepositoryError>;

    /// Recompute the average/count aggregate for a store.
    async fn rating_summary(&self, store: StoreId) -> Result<RatingSummary, RepositoryError>;

    /// All ratings of a store with rater name/email, newest first.
    async fn ratings_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithUser>, RepositoryError>;

    /// All ratings by a user with store name/address, newest first.
    async fn ratings_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<RatingWithStore>, RepositoryError>;

    /// Total number of ratings.
    async fn count_ratings(&self) -> Result<i64, RepositoryError>;
}
