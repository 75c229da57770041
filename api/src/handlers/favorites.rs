//! Favorite toggle endpoint handlers
//!
//! Both operations are idempotent: re-adding an existing favorite and
//! removing an absent one succeed without complaint. The user always comes
//! from the session token.

use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::ApiResult,
    models::{ApiResponse, FavoriteStatus},
    AppState,
};

/// Add a company to the current user's favorites
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<FavoriteStatus>>> {
    info!("User {} favoriting company {}", user_id, company_id);

    let status = state.relationships.add_favorite(user_id, company_id).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Remove a company from the current user's favorites
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<FavoriteStatus>>> {
    info!("User {} unfavoriting company {}", user_id, company_id);

    let status = state
        .relationships
        .remove_favorite(user_id, company_id)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}
