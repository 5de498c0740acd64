//! Store route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use store_ratings_core::{StoreId, UserId};

use crate::db::StoreFilter;
use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAdmin, RequireAuth, RequireStoreOwner};
use crate::models::Store;
use crate::services::stores::{
    CreateStoreInput, OwnerDashboard, StoreListing, UpdateStoreInput,
};
use crate::state::AppState;

/// Request body for store creation.
#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: UserId,
}

/// Request body for a partial store update. Absent fields stay untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

/// List stores with aggregates. Logged-in viewers also see their own rating
/// of each store.
///
/// # Errors
///
/// Returns an error if the listing query fails.
pub async fn index(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    Query(filter): Query<StoreFilter>,
) -> Result<Json<Vec<StoreListing>>> {
    let listings = state
        .stores()
        .list(&filter, viewer.map(|u| u.id))
        .await?;
    Ok(Json(listings))
}

/// Fetch one store.
///
/// # Errors
///
/// Returns 404 for an unknown store.
pub async fn show(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<Json<StoreListing>> {
    let listing = state.stores().get(id, viewer.map(|u| u.id)).await?;
    Ok(Json(listing))
}

/// Create a store and assign an owner (admin only).
///
/// # Errors
///
/// Returns an error on validation failure, an unknown or ineligible owner,
/// or a duplicate name/email.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>)> {
    let store = state
        .stores()
        .create(CreateStoreInput {
            name: body.name,
            email: body.email,
            address: body.address,
            owner_id: body.owner_id,
        })
        .await?;

    tracing::info!(store_id = %store.id, "store created");
    Ok((StatusCode::CREATED, Json(store)))
}

/// Apply a role-gated partial update. Admins may change any field; a store
/// owner only the email and address of their own store.
///
/// # Errors
///
/// Returns 403 for a forbidden field or actor, 400 for an empty diff.
pub async fn update(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<Store>> {
    let store = state
        .stores()
        .update(
            &actor,
            id,
            UpdateStoreInput {
                name: body.name,
                email: body.email,
                address: body.address,
                owner_id: body.owner_id,
            },
        )
        .await?;

    tracing::info!(store_id = %store.id, actor_id = %actor.id, "store updated");
    Ok(Json(store))
}

/// The store owner's dashboard: their store, its aggregate, and every
/// rating with rater identity.
///
/// # Errors
///
/// Returns 404 if the caller owns no store.
pub async fn owner_dashboard(
    RequireStoreOwner(owner): RequireStoreOwner,
    State(state): State<AppState>,
) -> Result<Json<OwnerDashboard>> {
    let dashboard = state.stores().owner_dashboard(owner.id).await?;
    Ok(Json(dashboard))
}
