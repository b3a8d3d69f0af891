use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;
use crate::error::FieldError;
use crate::llm::ProviderStatus;
use crate::models::{ChatRole, ChatTurn, ProblemContext};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Codehint API",
        version = "1.0.0",
        description = "Progressive hints and chat explanations for programming problems.",
    ),
    paths(
        handlers::health::root,
        handlers::health::health_check,
        handlers::hint::generate_hint,
        handlers::explain::explain,
    ),
    components(schemas(
        response::ErrorCode,
        response::ErrorBody,
        FieldError,
        ProblemContext,
        ChatRole,
        ChatTurn,
        ProviderStatus,
        dto::HintRequest,
        dto::HintResponse,
        dto::ExplainRequest,
        dto::ExplainResponse,
        dto::RootResponse,
        handlers::health::HealthData,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "hints", description = "Progressive hint generation"),
        (name = "explain", description = "Chat explanations"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
