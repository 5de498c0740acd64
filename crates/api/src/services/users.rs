//! User administration service: admin-created accounts, listings, and
//! platform statistics.

use std::sync::Arc;

use serde::Serialize;

use store_ratings_core::{Email, Role, UserId};

use crate::db::{Gateway, RepositoryError, UserFilter};
use crate::models::{NewUser, User};

use super::PolicyError;
use super::auth::hash_password;
use super::validation::{validate_address, validate_name, validate_password};

/// Input for an admin-created account. Unlike self-registration, any role
/// may be assigned.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub role: Role,
}

/// A user detail view. Store owners additionally carry their store's
/// average rating.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_rating: Option<f64>,
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// User administration operations over the persistence gateway.
#[derive(Clone)]
pub struct UserService {
    gateway: Arc<dyn Gateway>,
}

impl UserService {
    /// Create a new service.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Create an account with an arbitrary role (admin operation).
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::Validation`] on a broken field and
    /// [`PolicyError::Conflict`] on a duplicate email.
    pub async fn create(&self, input: CreateUserInput) -> Result<User, PolicyError> {
        validate_name(&input.name).map_err(PolicyError::Validation)?;
        validate_address(&input.address).map_err(PolicyError::Validation)?;
        validate_password(&input.password).map_err(PolicyError::Validation)?;
        let email: Email = input
            .email
            .parse()
            .map_err(|e: store_ratings_core::EmailError| PolicyError::Validation(e.to_string()))?;

        let password_hash =
            hash_password(&input.password).map_err(|e| PolicyError::Internal(e.to_string()))?;
        let new_user = NewUser {
            name: input.name,
            email,
            address: input.address,
            role: input.role,
            password_hash,
        };
        match self.gateway.insert_user(&new_user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Conflict(msg)) => Err(PolicyError::Conflict(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// List users matching a filter.
    ///
    /// # Errors
    ///
    /// Fails on repository errors only.
    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, PolicyError> {
        Ok(self.gateway.list_users(filter).await?)
    }

    /// Fetch one user. For store owners the detail view carries their
    /// store's average rating.
    ///
    /// # Errors
    ///
    /// Fails with [`PolicyError::NotFound`] for an unknown user.
    pub async fn get(&self, id: UserId) -> Result<UserDetail, PolicyError> {
        let Some(user) = self.gateway.find_user_by_id(id).await? else {
            return Err(PolicyError::NotFound("user"));
        };

        let store_rating = if user.role == Role::StoreOwner {
            match self.gateway.find_store_by_owner(user.id).await? {
                Some(store) => Some(self.gateway.rating_summary(store.id).await?.average_rating),
                None => None,
            }
        } else {
            None
        };

        Ok(UserDetail { user, store_rating })
    }

    /// Total users, stores, and ratings for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Fails on repository errors only.
    pub async fn stats(&self) -> Result<DashboardStats, PolicyError> {
        Ok(DashboardStats {
            total_users: self.gateway.count_users().await?,
            total_stores: self.gateway.count_stores().await?,
            total_ratings: self.gateway.count_ratings().await?,
        })
    }
}
