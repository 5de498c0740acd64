//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! sr-cli admin create -e admin@example.com -n "Platform Administrator X" \
//!     -a "1 Admin Plaza" -p 'Sup3r$ecret'
//! ```
//!
//! # Environment Variables
//!
//! - `APP_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use store_ratings_core::{Email, Role};

use super::{CommandError, connect};

/// Create a new admin user.
///
/// Admin accounts cannot self-register through the API; this command is the
/// only way to mint one.
///
/// # Errors
///
/// Returns an error on invalid input, a duplicate email, or a database
/// failure.
pub async fn create_user(
    email: &str,
    name: &str,
    address: &str,
    password: &str,
) -> Result<i32, CommandError> {
    let email: Email = email
        .parse()
        .map_err(|e: store_ratings_core::EmailError| CommandError::InvalidInput(e.to_string()))?;

    let name_len = name.chars().count();
    if !(20..=60).contains(&name_len) {
        return Err(CommandError::InvalidInput(
            "name must be between 20 and 60 characters".to_owned(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CommandError::InvalidInput(format!("password hashing failed: {e}")))?
        .to_string();

    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", email);

    let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(CommandError::AlreadyExists(format!(
            "a user already exists with email: {email}"
        )));
    }

    let user_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO users (name, email, address, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(email.as_str())
    .bind(address)
    .bind(&password_hash)
    .bind(Role::Admin)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user_id,
        email
    );

    Ok(user_id)
}
