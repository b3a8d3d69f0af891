//! # Error envelope
//!
//! Every failed request is answered with the same JSON shape:
//!
//! ```json
//! {
//!   "error": "Failed to generate hint",
//!   "details": "All LLM providers failed: [openai/gpt-4o-mini] ...",
//!   "code": "upstream_error",
//!   "fields": [{ "field": "problem_data.title", "message": "..." }]
//! }
//! ```
//!
//! `error` is a fixed per-endpoint summary, `details` carries the underlying
//! failure, and `fields` is present only for validation failures.
//!
//! Success bodies are endpoint-specific and are not wrapped.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{CodehintError, FieldError};

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Body could not be read as JSON. HTTP 400.
    InvalidRequest,
    /// Body was JSON but fields had the wrong shape or value. HTTP 422.
    ValidationFailed,
    /// A provider call failed. HTTP 502.
    UpstreamError,
    /// The model answered, but not in the required shape. HTTP 502.
    MalformedModelOutput,
    /// Every provider refused the call because of rate limits. HTTP 429.
    RateLimited,
    /// No provider is configured. HTTP 503.
    ProviderUnavailable,
    /// HTTP 500.
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamError | Self::MalformedModelOutput => StatusCode::BAD_GATEWAY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Fixed summary for the failing operation.
    pub error: String,
    /// Underlying failure message.
    pub details: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorBody {
    pub fn from_error(summary: &str, error: &CodehintError) -> Self {
        Self {
            error: summary.to_string(),
            details: error.public_message(),
            code: error.code(),
            fields: error.fields(),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// How an endpoint turns service errors into HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusPolicy {
    /// Use the status derived from the error kind.
    Typed,
    /// Client errors keep their 4xx; everything else is a 500.
    ServerErrorsAs500,
}

/// Error returned by a route handler: the service error plus the
/// endpoint's summary line and status policy.
#[derive(Debug)]
pub struct ApiFailure {
    summary: &'static str,
    policy: StatusPolicy,
    error: CodehintError,
}

impl ApiFailure {
    /// Failures of `POST /api/hint`: typed statuses (502/429/503/422).
    pub fn hint(error: CodehintError) -> Self {
        Self {
            summary: "Failed to generate hint",
            policy: StatusPolicy::Typed,
            error,
        }
    }

    /// Failures of `POST /api/explain`: anything but a bad request is a 500.
    pub fn explain(error: CodehintError) -> Self {
        Self {
            summary: "Failed to generate explanation",
            policy: StatusPolicy::ServerErrorsAs500,
            error,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.policy {
            StatusPolicy::Typed => self.error.status(),
            StatusPolicy::ServerErrorsAs500 if self.error.is_client_error() => {
                self.error.status()
            }
            StatusPolicy::ServerErrorsAs500 => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, status = status.as_u16(), "{}", self.summary);
        } else {
            tracing::warn!(error = %self.error, status = status.as_u16(), "{}", self.summary);
        }
        ErrorBody::from_error(self.summary, &self.error).into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderFailure;

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_value(ErrorCode::MalformedModelOutput).expect("serialize");
        assert_eq!(json, "malformed_model_output");
        let json = serde_json::to_value(ErrorCode::ValidationFailed).expect("serialize");
        assert_eq!(json, "validation_failed");
    }

    #[test]
    fn body_omits_fields_when_not_a_validation_error() {
        let body = ErrorBody::from_error("Failed", &CodehintError::Llm("timeout".into()));
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["error"], "Failed");
        assert_eq!(json["details"], "LLM error: timeout");
        assert_eq!(json["code"], "upstream_error");
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn body_lists_validation_fields() {
        let body = ErrorBody::from_error(
            "Invalid",
            &CodehintError::validation("problem_data.title", "must not be blank"),
        );
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["fields"][0]["field"], "problem_data.title");
    }

    #[test]
    fn explain_failures_are_500_unless_client_error() {
        let upstream = ApiFailure::explain(CodehintError::ProvidersExhausted(vec![ProviderFailure {
            provider: "openai/gpt-4o-mini".into(),
            message: "down".into(),
            rate_limited: true,
            unavailable: false,
        }]));
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let malformed = ApiFailure::explain(CodehintError::MalformedModelOutput("x".into()));
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let empty = ApiFailure::explain(CodehintError::EmptyChat);
        assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn hint_failures_use_typed_statuses() {
        let malformed = ApiFailure::hint(CodehintError::MalformedModelOutput("x".into()));
        assert_eq!(malformed.status(), StatusCode::BAD_GATEWAY);

        let unavailable = ApiFailure::hint(CodehintError::LlmUnavailable("none".into()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
