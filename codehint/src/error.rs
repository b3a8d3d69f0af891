use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::response::{ErrorBody, ErrorCode};

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `problem_data.title`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// One provider's failure inside a [`CodehintError::ProvidersExhausted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
    pub rate_limited: bool,
    /// The provider was never built, so no request reached it.
    pub unavailable: bool,
}

impl ProviderFailure {
    pub fn from_error(provider: impl Into<String>, error: &CodehintError) -> Self {
        Self {
            provider: provider.into(),
            message: error.to_string(),
            rate_limited: matches!(error, CodehintError::LlmRateLimit { .. }),
            unavailable: matches!(error, CodehintError::LlmUnavailable(_)),
        }
    }
}

#[derive(Error, Debug)]
pub enum CodehintError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Chat history cannot be empty")]
    EmptyChat,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("All LLM providers failed: {}", summarize_failures(.0))]
    ProvidersExhausted(Vec<ProviderFailure>),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn summarize_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("[{}] {}", failure.provider, failure.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CodehintError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = FieldError::new(field, message);
        Self::Validation {
            message: format!("{}: {}", field.field, field.message),
            fields: vec![field],
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadRequest(_) => ErrorCode::InvalidRequest,
            Self::Validation { .. } | Self::EmptyChat => ErrorCode::ValidationFailed,
            Self::Llm(_) => ErrorCode::UpstreamError,
            Self::LlmUnavailable(_) => ErrorCode::ProviderUnavailable,
            Self::LlmRateLimit { .. } => ErrorCode::RateLimited,
            Self::ProvidersExhausted(failures) => {
                let mut attempted = failures.iter().filter(|f| !f.unavailable).peekable();
                if attempted.peek().is_some() && attempted.all(|f| f.rate_limited) {
                    ErrorCode::RateLimited
                } else {
                    ErrorCode::UpstreamError
                }
            }
            Self::MalformedModelOutput(_) => ErrorCode::MalformedModelOutput,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code().status()
    }

    /// True for errors caused by the request itself rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_) | Self::Validation { .. } | Self::EmptyChat
        )
    }

    pub fn fields(&self) -> Vec<FieldError> {
        match self {
            Self::Validation { fields, .. } => fields.clone(),
            Self::EmptyChat => vec![FieldError::new(
                "chat",
                "must contain at least one user or assistant turn",
            )],
            _ => Vec::new(),
        }
    }

    /// Message safe to return to clients. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for CodehintError {
    fn into_response(self) -> Response {
        let summary = if self.is_client_error() {
            "Invalid request"
        } else {
            "Request failed"
        };
        let status = self.status();
        ErrorBody::from_error(summary, &self).into_response_with(status)
    }
}

pub type Result<T> = std::result::Result<T, CodehintError>;
