use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::dto::RootResponse;
use crate::api::state::AppState;
use crate::llm::ProviderStatus;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub providers: Vec<ProviderStatus>,
}

/// `GET /`
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service banner", body = RootResponse),
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "LeetCode AI Assistant API".to_string(),
    })
}

/// `GET /health`
///
/// Liveness only; provider availability is what was known at startup and
/// no upstream call is made.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    Json(HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state.providers.as_ref().clone(),
    })
}
