//! In-memory gateway for tests.
//!
//! Mirrors the query semantics of [`super::PgGateway`] (case-insensitive
//! substring filters, newest-first defaults, unique-email conflicts) over
//! plain vectors, so policy tests run without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use store_ratings_core::{Email, RatingId, RatingValue, StoreId, UserId};

use super::RepositoryError;
use super::gateway::{Gateway, SortOrder, StoreFilter, StoreSortKey, UserFilter, UserSortKey};
use crate::models::{
    NewStore, NewUser, Rating, RatingSummary, RatingWithStore, RatingWithUser, Store,
    StoreChanges, StoreWithRating, User,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    password_hashes: HashMap<UserId, String>,
    stores: Vec<Store>,
    ratings: Vec<Rating>,
    next_user_id: i32,
    next_store_id: i32,
    next_rating_id: i32,
}

/// An in-memory [`Gateway`] implementation.
#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn summary_for(ratings: &[Rating], store: StoreId) -> RatingSummary {
    let values: Vec<i32> = ratings
        .iter()
        .filter(|r| r.store_id == store)
        .map(|r| r.rating.as_i32())
        .collect();
    RatingSummary::from_values(&values)
}

impl MemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.email == *email).cloned())
    }

    async fn user_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.lock().await;
        let Some(user) = inner.users.iter().find(|u| u.email == *email).cloned() else {
            return Ok(None);
        };
        let Some(hash) = inner.password_hashes.get(&user.id).cloned() else {
            return Ok(None);
        };
        Ok(Some((user, hash)))
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|u| u.email == new_user.email) {
            return Err(RepositoryError::Conflict("user email already exists".into()));
        }

        inner.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(inner.next_user_id),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            address: new_user.address.clone(),
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        inner
            .password_hashes
            .insert(user.id, new_user.password_hash.clone());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.iter().any(|u| u.id == id) {
            return Err(RepositoryError::NotFound);
        }
        inner.password_hashes.insert(id, password_hash.to_owned());
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| {
                filter.name.as_deref().is_none_or(|n| contains_ci(&u.name, n))
                    && filter
                        .email
                        .as_deref()
                        .is_none_or(|e| contains_ci(u.email.as_str(), e))
                    && filter
                        .address
                        .as_deref()
                        .is_none_or(|a| contains_ci(&u.address, a))
                    && filter.role.is_none_or(|r| u.role == r)
            })
            .cloned()
            .collect();

        match filter.sort_by {
            Some(key) => {
                users.sort_by(|a, b| {
                    let ord = match key {
                        UserSortKey::Name => a.name.cmp(&b.name),
                        UserSortKey::Email => a.email.as_str().cmp(b.email.as_str()),
                        UserSortKey::Address => a.address.cmp(&b.address),
                        UserSortKey::Role => a.role.to_string().cmp(&b.role.to_string()),
                        UserSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                    };
                    match filter.sort_order {
                        SortOrder::Asc => ord,
                        SortOrder::Desc => ord.reverse(),
                    }
                });
            }
            None => users.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.len() as i64)
    }

    async fn find_store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn find_store_by_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .stores
            .iter()
            .find(|s| s.owner_id == Some(owner))
            .cloned())
    }

    async fn insert_store(&self, new_store: &NewStore) -> Result<Store, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.stores.iter().any(|s| s.email == new_store.email) {
            return Err(RepositoryError::Conflict(
                "store email already exists".into(),
            ));
        }

        inner.next_store_id += 1;
        let now = Utc::now();
        let store = Store {
            id: StoreId::new(inner.next_store_id),
            name: new_store.name.clone(),
            email: new_store.email.clone(),
            address: new_store.address.clone(),
            owner_id: Some(new_store.owner_id),
            created_at: now,
            updated_at: now,
        };
        inner.stores.push(store.clone());
        Ok(store)
    }

    async fn update_store_fields(
        &self,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<bool, RepositoryError> {
        if changes.is_empty() {
            return Ok(false);
        }
        let mut inner = self.inner.lock().await;
        let Some(store) = inner.stores.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };

        if let Some(name) = &changes.name {
            store.name.clone_from(name);
        }
        if let Some(email) = &changes.email {
            store.email = email.clone();
        }
        if let Some(address) = &changes.address {
            store.address.clone_from(address);
        }
        if let Some(owner_id) = changes.owner_id {
            store.owner_id = Some(owner_id);
        }
        store.updated_at = Utc::now();
        Ok(true)
    }

    async fn duplicate_store_exists(
        &self,
        name: Option<&str>,
        email: Option<&Email>,
        exclude: Option<StoreId>,
    ) -> Result<bool, RepositoryError> {
        if name.is_none() && email.is_none() {
            return Ok(false);
        }
        let inner = self.inner.lock().await;
        Ok(inner.stores.iter().any(|s| {
            exclude != Some(s.id)
                && (name.is_some_and(|n| s.name == n)
                    || email.is_some_and(|e| s.email == *e))
        }))
    }

    async fn list_stores(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithRating>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut stores: Vec<StoreWithRating> = inner
            .stores
            .iter()
            .filter(|s| {
                filter.name.as_deref().is_none_or(|n| contains_ci(&s.name, n))
                    && filter
                        .address
                        .as_deref()
                        .is_none_or(|a| contains_ci(&s.address, a))
            })
            .map(|s| {
                let owner_name = s.owner_id.and_then(|oid| {
                    inner.users.iter().find(|u| u.id == oid).map(|u| u.name.clone())
                });
                let summary = summary_for(&inner.ratings, s.id);
                StoreWithRating::compose(s.clone(), owner_name, summary)
            })
            .collect();

        match filter.sort_by {
            Some(key) => {
                stores.sort_by(|a, b| {
                    let ord = match key {
                        StoreSortKey::Name => a.name.cmp(&b.name),
                        StoreSortKey::Email => a.email.as_str().cmp(b.email.as_str()),
                        StoreSortKey::Address => a.address.cmp(&b.address),
                        StoreSortKey::AverageRating => {
                            a.average_rating.total_cmp(&b.average_rating)
                        }
                        StoreSortKey::TotalRatings => a.total_ratings.cmp(&b.total_ratings),
                    };
                    match filter.sort_order {
                        SortOrder::Asc => ord,
                        SortOrder::Desc => ord.reverse(),
                    }
                });
            }
            None => stores.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(stores)
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.stores.len() as i64)
    }

    async fn find_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .ratings
            .iter()
            .find(|r| r.user_id == user && r.store_id == store)
            .cloned())
    }

    async fn insert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner
            .ratings
            .iter()
            .any(|r| r.user_id == user && r.store_id == store)
        {
            return Err(RepositoryError::Conflict("rating already exists".into()));
        }

        inner.next_rating_id += 1;
        let now = Utc::now();
        let rating = Rating {
            id: RatingId::new(inner.next_rating_id),
            user_id: user,
            store_id: store,
            rating: value,
            created_at: now,
            updated_at: now,
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn update_rating_value(
        &self,
        id: RatingId,
        value: RatingValue,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Some(rating) = inner.ratings.iter_mut().find(|r| r.id == id) else {
            return Err(RepositoryError::NotFound);
        };
        rating.rating = value;
        rating.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let before = inner.ratings.len();
        inner
            .ratings
            .retain(|r| !(r.user_id == user && r.store_id == store));
        Ok(inner.ratings.len() < before)
    }

    async fn rating_summary(&self, store: StoreId) -> Result<RatingSummary, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(summary_for(&inner.ratings, store))
    }

    async fn ratings_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithUser>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut ratings: Vec<RatingWithUser> = inner
            .ratings
            .iter()
            .filter(|r| r.store_id == store)
            .filter_map(|r| {
                inner.users.iter().find(|u| u.id == r.user_id).map(|u| RatingWithUser {
                    id: r.id,
                    user_id: r.user_id,
                    rating: r.rating,
                    user_name: u.name.clone(),
                    user_email: u.email.as_str().to_owned(),
                    created_at: r.created_at,
                })
            })
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn ratings_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<RatingWithStore>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut ratings: Vec<RatingWithStore> = inner
            .ratings
            .iter()
            .filter(|r| r.user_id == user)
            .filter_map(|r| {
                inner.stores.iter().find(|s| s.id == r.store_id).map(|s| RatingWithStore {
                    id: r.id,
                    store_id: r.store_id,
                    rating: r.rating,
                    store_name: s.name.clone(),
                    store_address: s.address.clone(),
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                })
            })
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.ratings.len() as i64)
    }
}
