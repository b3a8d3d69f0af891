use axum::extract::State;
use axum::Json;

use crate::api::dto::{ExplainRequest, ExplainResponse};
use crate::api::extractors::AppJson;
use crate::api::response::{ApiFailure, ErrorBody};
use crate::api::state::AppState;

/// `POST /api/explain`
///
/// Answers the last chat turn. The user's code is attached to the prompt
/// only when the classifier decides the question needs it.
#[utoipa::path(
    post,
    path = "/api/explain",
    tag = "explain",
    request_body = ExplainRequest,
    responses(
        (status = 200, description = "Explanation generated", body = ExplainResponse),
        (status = 400, description = "Body is not JSON", body = ErrorBody),
        (status = 422, description = "Empty chat or invalid fields", body = ErrorBody),
        (status = 500, description = "Explanation could not be generated", body = ErrorBody),
    )
)]
pub async fn explain(
    State(state): State<AppState>,
    AppJson(request): AppJson<ExplainRequest>,
) -> Result<Json<ExplainResponse>, ApiFailure> {
    let explanation = state
        .explainer
        .explain(request.chat, &request.problem, &request.code)
        .await
        .map_err(ApiFailure::explain)?;

    Ok(Json(ExplainResponse {
        explanation: explanation.text,
    }))
}
