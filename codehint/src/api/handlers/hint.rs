use axum::extract::State;
use axum::Json;

use crate::api::dto::{HintRequest, HintResponse};
use crate::api::extractors::ValidatedJson;
use crate::api::response::{ApiFailure, ErrorBody};
use crate::api::state::AppState;

/// `POST /api/hint`
///
/// Generates all four hint levels for the problem in one model call.
#[utoipa::path(
    post,
    path = "/api/hint",
    tag = "hints",
    request_body = HintRequest,
    responses(
        (status = 200, description = "Hints generated", body = HintResponse),
        (status = 400, description = "Body is not JSON", body = ErrorBody),
        (status = 422, description = "Invalid request fields", body = ErrorBody),
        (status = 429, description = "Every provider is rate limited", body = ErrorBody),
        (status = 502, description = "Provider failed or returned malformed hints", body = ErrorBody),
        (status = 503, description = "No provider configured", body = ErrorBody),
    )
)]
pub async fn generate_hint(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<HintRequest>,
) -> Result<Json<HintResponse>, ApiFailure> {
    tracing::info!(
        hint_level = request.hint_level,
        problem_id = %request.problem_data.id,
        "Hint requested"
    );

    let outcome = state
        .hints
        .generate(&request.problem_data)
        .await
        .map_err(ApiFailure::hint)?;

    Ok(Json(HintResponse::from_outcome(outcome)))
}
