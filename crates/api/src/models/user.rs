//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, Role, UserId};

/// A platform user (domain type).
///
/// The password hash is never part of this type; it is fetched separately
/// by the authentication service and stays out of API responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Permission level.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub role: Role,
    /// Argon2 password hash produced by the auth service.
    pub password_hash: String,
}
