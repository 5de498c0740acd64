//! User administration route handlers (admin only).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use store_ratings_core::{Role, UserId};

use crate::db::UserFilter;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::services::users::{CreateUserInput, DashboardStats, UserDetail};
use crate::state::AppState;

/// Request body for an admin-created account.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Create an account with any role.
///
/// # Errors
///
/// Returns an error on validation failure or a duplicate email.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state
        .users()
        .create(CreateUserInput {
            name: body.name,
            email: body.email,
            address: body.address,
            password: body.password,
            role: body.role,
        })
        .await?;

    tracing::info!(user_id = %user.id, admin_id = %admin.id, "user created by admin");
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users with filters and sorting.
///
/// # Errors
///
/// Returns an error if the listing query fails.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>> {
    let users = state.users().list(&filter).await?;
    Ok(Json(users))
}

/// Fetch one user. Store owners carry their store's average rating.
///
/// # Errors
///
/// Returns 404 for an unknown user.
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>> {
    let detail = state.users().get(id).await?;
    Ok(Json(detail))
}

/// Platform-wide counters for the admin dashboard.
///
/// # Errors
///
/// Returns an error if a count query fails.
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>> {
    let stats = state.users().stats().await?;
    Ok(Json(stats))
}
