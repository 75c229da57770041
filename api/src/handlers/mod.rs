//! HTTP request handlers for the Sahm API
//!
//! This module contains all the HTTP endpoint handlers organized by
//! functionality:
//! - Company browsing (listing, search, favorites listing, detail view)
//! - Favorite toggles
//! - Subscription management
//! - Utility endpoints (health check, API info)

use crate::models::ApiResponse;
use crate::AppState;
use axum::{extract::State, response::Json};
use serde_json::json;
use std::sync::Arc;

pub mod companies;
pub mod favorites;
pub mod subscriptions;

// Re-export all handler functions
pub use companies::{get_company, list_companies, list_favorite_companies};
pub use favorites::{add_favorite, remove_favorite};
pub use subscriptions::{remove_subscription, set_subscription};

/// Health check endpoint
///
/// Reports the API process and its database connectivity. Used by
/// monitoring and load balancer health checks.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = match state.db_manager.health_check().await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    Json(json!({
        "status": if database == "up" { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "sahm-api"
    }))
}

/// API information endpoint
///
/// Returns general information about the API including available
/// endpoints and version information.
pub async fn api_info() -> Json<ApiResponse<serde_json::Value>> {
    let info = json!({
        "name": "Sahm Company API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Company market-data platform: profiles, history, favorites and subscriptions",
        "endpoints": {
            "health": "/health",
            "companies": {
                "list": "/api/v1/companies",
                "favorites": "/api/v1/companies/favorites",
                "detail": "/api/v1/companies/{id}",
                "favorite": "/api/v1/companies/{id}/favorite",
                "subscribe": "/api/v1/companies/{id}/subscribe"
            }
        },
        "documentation": "/api/v1/docs"
    });

    Json(ApiResponse::success(info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_info() {
        let response = api_info().await;
        assert!(response.0.success);
        assert!(response.0.data.is_some());
    }
}
