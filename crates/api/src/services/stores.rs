//! Store service: creation, listings, the owner dashboard, and the
//! role-gated update policy.

use std::sync::Arc;

use serde::Serialize;

use store_ratings_core::{Email, Role, StoreId, UserId};

use crate::db::{Gateway, RepositoryError, StoreFilter};
use crate::models::{
    CurrentUser, NewStore, RatingWithUser, Store, StoreChanges, StoreWithRating,
};

use super::PolicyError;
use super::validation::{validate_address, validate_name};

/// Input for creating a store.
#[derive(Debug, Clone)]
pub struct CreateStoreInput {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: UserId,
}

/// A partial update request. `None` fields were not submitted.
#[derive(Debug, Clone, Default)]
pub struct UpdateStoreInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

/// A store listing entry with the viewing user's own rating, if any.
#[derive(Debug, Serialize)]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: StoreWithRating,
    pub user_rating: Option<i32>,
}

/// Everything a store owner's dashboard shows.
#[derive(Debug, Serialize)]
pub struct OwnerDashboard {
    pub store: Store,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub ratings: Vec<RatingWithUser>,
}

/// Store operations over the persistence gateway.
#[derive(Clone)]
pub struct StoreService {
    gateway: Arc<dyn Gateway>,
}

impl StoreService {
    /// Create a new service.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Create a store and assign it to an owner (admin operation).
    ///
    /// The owner must exist, hold the `store_owner` role, and not already
    /// own a store. Name and email must be unused by any other store.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::Validation`] on a broken field or an
    /// ineligible owner, [`PolicyError::NotFound`] for an unknown owner,
    /// and [`PolicyError::Conflict`] on a duplicate name or email.
    pub async fn create(&self, input: CreateStoreInput) -> Result<Store, PolicyError> {
        validate_name(&input.name).map_err(PolicyError::Validation)?;
        validate_address(&input.address).map_err(PolicyError::Validation)?;
        let email: Email = input
            .email
            .parse()
            .map_err(|e: store_ratings_core::EmailError| PolicyError::Validation(e.to_string()))?;

        let Some(owner) = self.gateway.find_user_by_id(input.owner_id).await? else {
            return Err(PolicyError::NotFound("owner"));
        };
        if owner.role != Role::StoreOwner {
            return Err(PolicyError::Validation(
                "the assigned owner must have the store_owner role".to_owned(),
            ));
        }
        if self.gateway.find_store_by_owner(owner.id).await?.is_some() {
            return Err(PolicyError::Validation(
                "this owner already has a store".to_owned(),
            ));
        }
        if self
            .gateway
            .duplicate_store_exists(Some(&input.name), Some(&email), None)
            .await?
        {
            return Err(PolicyError::Conflict(
                "a store with this name or email already exists".to_owned(),
            ));
        }

        let new_store = NewStore {
            name: input.name,
            email,
            address: input.address,
            owner_id: owner.id,
        };
        match self.gateway.insert_store(&new_store).await {
            Ok(store) => Ok(store),
            Err(RepositoryError::Conflict(msg)) => Err(PolicyError::Conflict(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// List stores with aggregates, each annotated with the viewer's own
    /// rating when a viewer is given.
    ///
    /// # Errors
    ///
    /// Fails on repository errors only.
    pub async fn list(
        &self,
        filter: &StoreFilter,
        viewer: Option<UserId>,
    ) -> Result<Vec<StoreListing>, PolicyError> {
        let stores = self.gateway.list_stores(filter).await?;
        let mut listings = Vec::with_capacity(stores.len());
        for store in stores {
            let user_rating = match viewer {
                Some(user) => self
                    .gateway
                    .find_rating(user, store.id)
                    .await?
                    .map(|r| r.rating.as_i32()),
                None => None,
            };
            listings.push(StoreListing { store, user_rating });
        }
        Ok(listings)
    }

    /// Fetch one store with its aggregate and the viewer's own rating.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::NotFound`] for an unknown store.
    pub async fn get(
        &self,
        id: StoreId,
        viewer: Option<UserId>,
    ) -> Result<StoreListing, PolicyError> {
        let Some(store) = self.gateway.find_store_by_id(id).await? else {
            return Err(PolicyError::NotFound("store"));
        };
        let owner_name = match store.owner_id {
            Some(owner) => self
                .gateway
                .find_user_by_id(owner)
                .await?
                .map(|u| u.name),
            None => None,
        };
        let summary = self.gateway.rating_summary(id).await?;
        let user_rating = match viewer {
            Some(user) => self
                .gateway
                .find_rating(user, id)
                .await?
                .map(|r| r.rating.as_i32()),
            None => None,
        };
        Ok(StoreListing {
            store: StoreWithRating::compose(store, owner_name, summary),
            user_rating,
        })
    }

    /// Apply a role-gated partial update to a store.
    ///
    /// Admins may change any field including the owner; a store owner may
    /// change only the email and address of their own store, though
    /// resubmitting the current name or owner is tolerated as a no-op.
    /// Fields whose submitted value equals the current value are dropped
    /// from the diff,
    /// and an all-dropped request fails with [`PolicyError::NoChange`]
    /// before any authorization-independent side effects.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::NotFound`], [`PolicyError::Forbidden`],
    /// [`PolicyError::Validation`], [`PolicyError::Conflict`], or
    /// [`PolicyError::NoChange`] per the policy.
    pub async fn update(
        &self,
        actor: &CurrentUser,
        id: StoreId,
        input: UpdateStoreInput,
    ) -> Result<Store, PolicyError> {
        let Some(store) = self.gateway.find_store_by_id(id).await? else {
            return Err(PolicyError::NotFound("store"));
        };

        match actor.role {
            Role::Admin => {}
            Role::StoreOwner => {
                if store.owner_id != Some(actor.id) {
                    return Err(PolicyError::Forbidden(
                        "you may only update your own store",
                    ));
                }
                // Resubmitting the current value is a no-op, not a breach
                let name_changed = input.name.as_deref().is_some_and(|n| n != store.name);
                let owner_changed =
                    input.owner_id.is_some_and(|o| Some(o) != store.owner_id);
                if name_changed || owner_changed {
                    return Err(PolicyError::Forbidden(
                        "store owners may only update the email and address",
                    ));
                }
            }
            Role::User => {
                return Err(PolicyError::Forbidden(
                    "you are not allowed to update stores",
                ));
            }
        }

        let changes = self.build_diff(&store, input).await?;
        if changes.is_empty() {
            return Err(PolicyError::NoChange);
        }

        if changes.name.is_some() || changes.email.is_some() {
            let dup = self
                .gateway
                .duplicate_store_exists(
                    changes.name.as_deref(),
                    changes.email.as_ref(),
                    Some(id),
                )
                .await?;
            if dup {
                return Err(PolicyError::Conflict(
                    "a store with this name or email already exists".to_owned(),
                ));
            }
        }

        if let Err(e) = self.gateway.update_store_fields(id, &changes).await {
            // Lost a name/email uniqueness race against a concurrent writer
            return Err(match e {
                RepositoryError::Conflict(msg) => PolicyError::Conflict(msg),
                e => e.into(),
            });
        }
        let Some(updated) = self.gateway.find_store_by_id(id).await? else {
            return Err(PolicyError::NotFound("store"));
        };
        Ok(updated)
    }

    /// Validate submitted fields and drop the ones that match the current
    /// state. Owner reassignment is checked here so an unchanged owner_id
    /// never triggers the uniqueness rule.
    async fn build_diff(
        &self,
        store: &Store,
        input: UpdateStoreInput,
    ) -> Result<StoreChanges, PolicyError> {
        let mut changes = StoreChanges::default();

        if let Some(name) = input.name {
            validate_name(&name).map_err(PolicyError::Validation)?;
            if name != store.name {
                changes.name = Some(name);
            }
        }
        if let Some(email) = input.email {
            let email: Email = email.parse().map_err(
                |e: store_ratings_core::EmailError| PolicyError::Validation(e.to_string()),
            )?;
            if email != store.email {
                changes.email = Some(email);
            }
        }
        if let Some(address) = input.address {
            validate_address(&address).map_err(PolicyError::Validation)?;
            if address != store.address {
                changes.address = Some(address);
            }
        }
        if let Some(owner_id) = input.owner_id
            && Some(owner_id) != store.owner_id
        {
            let Some(owner) = self.gateway.find_user_by_id(owner_id).await? else {
                return Err(PolicyError::NotFound("owner"));
            };
            if owner.role != Role::StoreOwner {
                return Err(PolicyError::Validation(
                    "the assigned owner must have the store_owner role".to_owned(),
                ));
            }
            if let Some(existing) = self.gateway.find_store_by_owner(owner_id).await?
                && existing.id != store.id
            {
                return Err(PolicyError::Validation(
                    "this owner already has a store".to_owned(),
                ));
            }
            changes.owner_id = Some(owner_id);
        }

        Ok(changes)
    }

    /// Everything the owner dashboard needs: the store, its aggregate, and
    /// the individual ratings with rater identity.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::NotFound`] if the user owns no store.
    pub async fn owner_dashboard(&self, owner: UserId) -> Result<OwnerDashboard, PolicyError> {
        let Some(store) = self.gateway.find_store_by_owner(owner).await? else {
            return Err(PolicyError::NotFound("store"));
        };
        let summary = self.gateway.rating_summary(store.id).await?;
        let ratings = self.gateway.ratings_for_store(store.id).await?;
        Ok(OwnerDashboard {
            store,
            average_rating: summary.average_rating,
            total_ratings: summary.total_ratings,
            ratings,
        })
    }
}
