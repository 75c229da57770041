//! Subscription endpoint handlers
//!
//! Upserts and removes the per-company notification subscription for the
//! session user. Flag defaults apply only when the subscription is first
//! created; updates replace the whole vector.

use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::ApiResult,
    models::{ApiResponse, SubscriptionRequest, SubscriptionStatus},
    AppState,
};

/// Create or replace the current user's subscription for a company
pub async fn set_subscription(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(company_id): Path<i64>,
    Json(request): Json<SubscriptionRequest>,
) -> ApiResult<Json<ApiResponse<SubscriptionStatus>>> {
    info!("User {} subscribing to company {}", user_id, company_id);

    let status = state
        .relationships
        .subscribe(user_id, company_id, &request)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Remove the current user's subscription for a company
pub async fn remove_subscription(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<SubscriptionStatus>>> {
    info!("User {} unsubscribing from company {}", user_id, company_id);

    let status = state.relationships.unsubscribe(user_id, company_id).await?;
    Ok(Json(ApiResponse::success(status)))
}
