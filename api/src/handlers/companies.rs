//! Company browsing endpoint handlers
//!
//! Listing with search/type filters, the signed-in user's favorites page,
//! and the aggregate company detail view. The two list endpoints and the
//! detail view accept anonymous callers; personalized fields simply stay
//! false/absent without a session.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::ApiResult,
    models::{
        ApiResponse, CompanyDetailView, CompanyIndexView, FavoritesView, ListCompaniesQuery,
        PageQuery,
    },
    AppState,
};

/// List companies with optional search and type filters
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<ListCompaniesQuery>,
) -> ApiResult<Json<ApiResponse<CompanyIndexView>>> {
    info!(
        "Listing companies: search={:?} type_id={:?} page={}",
        query.search,
        query.type_id,
        query.page()
    );

    query.validate()?;

    let view = state.browser.list(&query, viewer).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// List the current user's favorited companies
pub async fn list_favorite_companies(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<FavoritesView>>> {
    info!("Listing favorites for user {} page {}", user_id, query.page());

    query.validate()?;

    let view = state.browser.favorites(user_id, &query).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Company detail view with bounded windows of related history
pub async fn get_company(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<CompanyDetailView>>> {
    info!("Fetching company {} detail", company_id);

    let view = state.aggregator.detail(company_id, viewer).await?;
    Ok(Json(ApiResponse::success(view)))
}
