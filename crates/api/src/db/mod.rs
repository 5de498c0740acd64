//! Persistence layer.
//!
//! # Tables
//!
//! - `users` - Accounts with role and argon2 password hash
//! - `stores` - Stores with an optional owning user
//! - `ratings` - One row per (user, store) pair, value 1..=5
//! - `sessions` - Tower-sessions storage (created by the session store)
//!
//! # Gateway
//!
//! All reads and writes go through the [`Gateway`] trait so the policy layer
//! never touches a process-wide pool directly. [`PgGateway`] is the
//! production implementation; [`MemoryGateway`] is the in-memory fake used
//! by the policy tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p store-ratings-cli -- migrate
//! ```

pub mod gateway;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use gateway::{Gateway, SortOrder, StoreFilter, StoreSortKey, UserFilter, UserSortKey};
pub use memory::MemoryGateway;
pub use postgres::PgGateway;

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
