//! Business logic services.
//!
//! Services own the policy decisions (who may change what, which writes are
//! upserts, which inputs are rejected) and talk to storage exclusively
//! through the [`Gateway`](crate::db::Gateway) trait. HTTP handlers stay
//! thin: deserialize, call a service, serialize.

pub mod auth;
pub mod ratings;
pub mod stores;
pub mod users;
pub mod validation;

use thiserror::Error;

use crate::db::RepositoryError;

pub use auth::{AuthError, AuthService};
pub use ratings::RatingService;
pub use stores::StoreService;
pub use users::UserService;

/// Errors shared by the rating, store, and user services.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The addressed entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The actor's role does not permit this operation.
    #[error("{0}")]
    Forbidden(&'static str),

    /// An input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness rule would be violated.
    #[error("{0}")]
    Conflict(String),

    /// An update request where every field matched the current state.
    #[error("no changes detected")]
    NoChange,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Unexpected internal failure (e.g., password hashing).
    #[error("internal error: {0}")]
    Internal(String),
}
