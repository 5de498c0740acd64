//! Session domain types.

use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, Role, UserId};

use super::user::User;

/// Session keys for stored values.
pub mod session_keys {
    /// Key for the currently authenticated user.
    pub const CURRENT_USER: &str = "current_user";
}

/// The authenticated principal stored in the session.
///
/// Policies trust this input; the session layer has already verified it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
