//! Seed the database with sample data for local development.
//!
//! Creates a handful of users, store owners, stores, and ratings. The
//! command is idempotent: rows keyed by an already-seeded email are skipped.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use store_ratings_core::Role;

use super::{CommandError, connect};

/// Password shared by all seeded accounts.
const SEED_PASSWORD: &str = "Seed$ample1";

struct SeedUser {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    role: Role,
}

struct SeedStore {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    owner_email: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        name: "Alexandra Hamilton Whitmore",
        email: "alexandra@example.com",
        address: "221B Baker Street, London",
        role: Role::User,
    },
    SeedUser {
        name: "Bernard Castellano Figueroa",
        email: "bernard@example.com",
        address: "14 Rue de la Paix, Paris",
        role: Role::User,
    },
    SeedUser {
        name: "Catherine Oduya Blackwood",
        email: "catherine@example.com",
        address: "99 Collins Avenue, Miami",
        role: Role::StoreOwner,
    },
    SeedUser {
        name: "Dominic Vasquez Oyelaran",
        email: "dominic@example.com",
        address: "7 Harbour Front, Cape Town",
        role: Role::StoreOwner,
    },
];

const STORES: &[SeedStore] = &[
    SeedStore {
        name: "The Corner Bakery and Coffee House",
        email: "corner.bakery@example.com",
        address: "12 Market Square, Springfield",
        owner_email: "catherine@example.com",
    },
    SeedStore {
        name: "Grand Avenue Books and Stationery",
        email: "grand.books@example.com",
        address: "88 Grand Avenue, Riverside",
        owner_email: "dominic@example.com",
    },
];

/// Ratings as (user email, store email, value).
const RATINGS: &[(&str, &str, i32)] = &[
    ("alexandra@example.com", "corner.bakery@example.com", 5),
    ("bernard@example.com", "corner.bakery@example.com", 4),
    ("alexandra@example.com", "grand.books@example.com", 3),
];

/// Seed the database.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(SEED_PASSWORD.as_bytes(), &salt)
        .map_err(|e| CommandError::InvalidInput(format!("password hashing failed: {e}")))?
        .to_string();

    let mut inserted_users = 0;
    for user in USERS {
        if seed_user(&pool, user, &password_hash).await? {
            inserted_users += 1;
        }
    }

    let mut inserted_stores = 0;
    for store in STORES {
        if seed_store(&pool, store).await? {
            inserted_stores += 1;
        }
    }

    let mut inserted_ratings = 0;
    for (user_email, store_email, value) in RATINGS {
        if seed_rating(&pool, user_email, store_email, *value).await? {
            inserted_ratings += 1;
        }
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Users inserted: {inserted_users}");
    tracing::info!("  Stores inserted: {inserted_stores}");
    tracing::info!("  Ratings inserted: {inserted_ratings}");
    tracing::info!("  All seeded accounts use the password: {SEED_PASSWORD}");

    Ok(())
}

async fn seed_user(
    pool: &PgPool,
    user: &SeedUser,
    password_hash: &str,
) -> Result<bool, CommandError> {
    let result = sqlx::query(
        r"
        INSERT INTO users (name, email, address, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.address)
    .bind(password_hash)
    .bind(user.role)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn seed_store(pool: &PgPool, store: &SeedStore) -> Result<bool, CommandError> {
    let result = sqlx::query(
        r"
        INSERT INTO stores (name, email, address, owner_id)
        SELECT $1, $2, $3, u.id FROM users u WHERE u.email = $4
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .bind(store.name)
    .bind(store.email)
    .bind(store.address)
    .bind(store.owner_email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn seed_rating(
    pool: &PgPool,
    user_email: &str,
    store_email: &str,
    value: i32,
) -> Result<bool, CommandError> {
    let result = sqlx::query(
        r"
        INSERT INTO ratings (user_id, store_id, rating)
        SELECT u.id, s.id, $3
        FROM users u, stores s
        WHERE u.email = $1 AND s.email = $2
        ON CONFLICT (user_id, store_id) DO NOTHING
        ",
    )
    .bind(user_email)
    .bind(store_email)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
