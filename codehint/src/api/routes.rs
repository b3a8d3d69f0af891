use std::sync::Arc;

use axum::http::{request, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::openapi;
use super::AppState;
use crate::config::ServerConfig;

const EXTENSION_ORIGIN_PREFIX: &str = "chrome-extension://";

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);
    let body_limit = RequestBodyLimitLayer::new(state.config.server.max_body_bytes);

    let api = Router::new()
        .route("/hint", post(handlers::generate_hint))
        .route("/explain", post(handlers::explain))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(openapi::redoc_router());

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any browser-extension origin, plus the configured exact origins.
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// preflight rather than wildcarded.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let allowed: Arc<Vec<String>> = Arc::new(server.cors_origins.clone());

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                origin_allowed(origin, &allowed)
            },
        ))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

fn origin_allowed(origin: &HeaderValue, allowed: &[String]) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    origin.starts_with(EXTENSION_ORIGIN_PREFIX) || allowed.iter().any(|a| a == origin)
}
