//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (verifies database)
//!
//! # Auth
//! POST /api/auth/register       - Self-service registration
//! POST /api/auth/login          - Login (creates session)
//! POST /api/auth/logout         - Logout (destroys session)
//! GET  /api/auth/me             - Current session user
//! PUT  /api/auth/password       - Change own password
//!
//! # Stores
//! GET  /api/stores              - List stores with aggregates and own rating
//! GET  /api/stores/{id}         - Store detail
//! POST /api/stores              - Create store (admin)
//! PUT  /api/stores/{id}         - Role-gated partial update
//! GET  /api/stores/owner/dashboard - Owner dashboard (store owner)
//!
//! # Ratings (requires auth)
//! POST   /api/ratings           - Submit or overwrite a rating
//! DELETE /api/ratings/{store_id} - Withdraw a rating
//! GET    /api/ratings/mine      - Caller's ratings
//!
//! # Admin
//! POST /api/users               - Create user with any role
//! GET  /api/users               - List users with filters
//! GET  /api/users/{id}          - User detail
//! GET  /api/stats               - Platform counters
//! ```

pub mod auth;
pub mod ratings;
pub mod stores;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/password", put(auth::update_password))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index).post(stores::create))
        .route("/owner/dashboard", get(stores::owner_dashboard))
        .route("/{id}", get(stores::show).put(stores::update))
}

/// Create the rating routes router.
pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ratings::submit))
        .route("/mine", get(ratings::mine))
        .route("/{store_id}", delete(ratings::withdraw))
}

/// Create the user administration routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/{id}", get(users::show))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/stores", store_routes())
        .nest("/api/ratings", rating_routes())
        .nest("/api/users", user_routes())
        .route("/api/stats", get(users::stats))
}
