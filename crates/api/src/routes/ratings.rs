//! Rating route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use store_ratings_core::StoreId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{RatingSummary, RatingWithStore};
use crate::services::ratings::RatingSubmission;
use crate::state::AppState;

/// Request body for a rating submission.
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub store_id: StoreId,
    pub rating: i32,
}

/// Submit a rating. Rating the same store again overwrites the earlier
/// value in place.
///
/// # Errors
///
/// Returns 400 for an out-of-range value, 404 for an unknown store.
pub async fn submit(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<SubmitRatingRequest>,
) -> Result<Json<RatingSubmission>> {
    let submission = state
        .ratings()
        .submit(user.id, body.store_id, body.rating)
        .await?;

    tracing::info!(
        user_id = %user.id,
        store_id = %body.store_id,
        rating = body.rating,
        created = submission.created,
        "rating submitted"
    );
    Ok(Json(submission))
}

/// Withdraw the caller's rating of a store.
///
/// # Errors
///
/// Returns 404 if the store is unknown or the caller never rated it.
pub async fn withdraw(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<RatingSummary>> {
    let summary = state.ratings().withdraw(user.id, store_id).await?;

    tracing::info!(user_id = %user.id, store_id = %store_id, "rating withdrawn");
    Ok(Json(summary))
}

/// The caller's ratings with the rated stores' name and address.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn mine(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<RatingWithStore>>> {
    let ratings = state.ratings().ratings_for_user(user.id).await?;
    Ok(Json(ratings))
}
