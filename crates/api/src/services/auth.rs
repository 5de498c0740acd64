//! Authentication service: registration, login, password changes.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use store_ratings_core::{Email, EmailError, Role, UserId};

use crate::db::{Gateway, RepositoryError};
use crate::models::{NewUser, User};

use super::validation::{validate_address, validate_name, validate_password};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong password or unknown email. Deliberately indistinct.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found (password change for a vanished account).
    #[error("user not found")]
    UserNotFound,

    /// Email already registered.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// A registration field failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// Input for self-service registration.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    /// Defaults to [`Role::User`]; admin accounts cannot self-register.
    pub role: Option<Role>,
}

/// Authentication operations over the persistence gateway.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn Gateway>,
}

impl AuthService {
    /// Create a new service.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidInput`] on a broken field,
    /// [`AuthError::UserAlreadyExists`] on a duplicate email, and
    /// [`AuthError::InvalidInput`] if the requested role is `admin`.
    pub async fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        validate_name(&input.name).map_err(AuthError::InvalidInput)?;
        validate_address(&input.address).map_err(AuthError::InvalidInput)?;
        validate_password(&input.password).map_err(AuthError::InvalidInput)?;
        let email: Email = input.email.parse()?;

        let role = input.role.unwrap_or_default();
        if role.is_admin() {
            return Err(AuthError::InvalidInput(
                "admin accounts cannot be self-registered".to_owned(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let new_user = NewUser {
            name: input.name,
            email,
            address: input.address,
            role,
            password_hash,
        };

        match self.gateway.insert_user(&new_user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Conflict(_)) => Err(AuthError::UserAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and return the account.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidCredentials`] for an unknown email or
    /// a wrong password; the two cases are not distinguished.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email: Email = email.parse().map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, hash)) = self.gateway.user_with_password_hash(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        verify_password(password, &hash)?;
        Ok(user)
    }

    /// Change a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidCredentials`] if the current password
    /// is wrong and [`AuthError::InvalidInput`] if the new one is weak.
    pub async fn update_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password).map_err(AuthError::InvalidInput)?;

        let Some(user) = self.gateway.find_user_by_id(user_id).await? else {
            return Err(AuthError::UserNotFound);
        };
        let Some((_, hash)) = self.gateway.user_with_password_hash(&user.email).await? else {
            return Err(AuthError::UserNotFound);
        };
        verify_password(current_password, &hash)?;

        let new_hash = hash_password(new_password)?;
        match self.gateway.update_user_password(user_id, &new_hash).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("Valid$ecret1").unwrap();
        assert!(verify_password("Valid$ecret1", &hash).is_ok());
        assert!(verify_password("Wrong$ecret1", &hash).is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Valid$ecret1").unwrap();
        let b = hash_password("Valid$ecret1").unwrap();
        assert_ne!(a, b);
    }
}
