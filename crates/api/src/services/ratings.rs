//! Rating service: submit, withdraw, and list ratings.

use std::sync::Arc;

use serde::Serialize;

use store_ratings_core::{RatingValue, StoreId, UserId};

use crate::db::{Gateway, RepositoryError};
use crate::models::{Rating, RatingSummary, RatingWithStore};

use super::PolicyError;

/// Result of a rating submission.
#[derive(Debug, Serialize)]
pub struct RatingSubmission {
    /// The rating row after the write.
    pub rating: Rating,
    /// `true` when this was the user's first rating of the store.
    pub created: bool,
    /// The store's aggregate after the write.
    pub summary: RatingSummary,
}

/// Rating operations over the persistence gateway.
#[derive(Clone)]
pub struct RatingService {
    gateway: Arc<dyn Gateway>,
}

impl RatingService {
    /// Create a new service.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Submit a rating, overwriting any earlier rating of the same store by
    /// the same user in place.
    ///
    /// A resubmission keeps the original rating id; only the value and the
    /// updated timestamp change. Two concurrent first submissions race on
    /// the unique (user, store) index, so the loser retries as an update.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::Validation`] for an out-of-range value and
    /// [`PolicyError::NotFound`] for an unknown store.
    pub async fn submit(
        &self,
        user: UserId,
        store: StoreId,
        value: i32,
    ) -> Result<RatingSubmission, PolicyError> {
        let value = RatingValue::try_new(value)
            .map_err(|e| PolicyError::Validation(e.to_string()))?;

        if self.gateway.find_store_by_id(store).await?.is_none() {
            return Err(PolicyError::NotFound("store"));
        }

        let (rating, created) = match self.gateway.find_rating(user, store).await? {
            Some(existing) => (self.overwrite(existing, value).await?, false),
            None => match self.gateway.insert_rating(user, store, value).await {
                Ok(rating) => (rating, true),
                // Lost the race against a concurrent first submission.
                Err(RepositoryError::Conflict(_)) => {
                    let Some(existing) = self.gateway.find_rating(user, store).await? else {
                        return Err(PolicyError::NotFound("rating"));
                    };
                    (self.overwrite(existing, value).await?, false)
                }
                Err(e) => return Err(e.into()),
            },
        };

        let summary = self.gateway.rating_summary(store).await?;
        Ok(RatingSubmission {
            rating,
            created,
            summary,
        })
    }

    async fn overwrite(
        &self,
        existing: Rating,
        value: RatingValue,
    ) -> Result<Rating, PolicyError> {
        self.gateway.update_rating_value(existing.id, value).await?;
        let Some(updated) = self
            .gateway
            .find_rating(existing.user_id, existing.store_id)
            .await?
        else {
            return Err(PolicyError::NotFound("rating"));
        };
        Ok(updated)
    }

    /// Withdraw the caller's rating of a store.
    ///
    /// Returns the store's aggregate after the deletion.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::NotFound`] if the store does not exist or
    /// the user never rated it.
    pub async fn withdraw(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<RatingSummary, PolicyError> {
        if self.gateway.find_store_by_id(store).await?.is_none() {
            return Err(PolicyError::NotFound("store"));
        }
        if !self.gateway.delete_rating(user, store).await? {
            return Err(PolicyError::NotFound("rating"));
        }
        Ok(self.gateway.rating_summary(store).await?)
    }

    /// All of a user's ratings with the rated store's name and address.
    ///
    /// # Errors
    ///
    /// Fails on repository errors only.
    pub async fn ratings_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<RatingWithStore>, PolicyError> {
        Ok(self.gateway.ratings_for_user(user).await?)
    }
}
