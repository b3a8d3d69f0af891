//! Request and response bodies of the HTTP API.
//!
//! Field names match what the browser extension already sends and reads.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ChatTurn, HintSet, ProblemContext};
use crate::services::HintOutcome;

fn default_hint_level() -> u8 {
    1
}

/// Body of `POST /api/hint`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct HintRequest {
    #[validate(nested)]
    pub problem_data: ProblemContext,
    /// Level the user is currently viewing. All four levels are returned
    /// regardless.
    #[serde(default = "default_hint_level")]
    #[validate(range(min = 1, max = 4, message = "must be between 1 and 4"))]
    #[schema(minimum = 1, maximum = 4, default = 1)]
    pub hint_level: u8,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HintResponse {
    /// Hint text keyed by level, `"1"` through `"4"`.
    #[schema(value_type = std::collections::HashMap<String, String>)]
    pub hint: HintSet,
    pub problem_title: String,
    /// RFC 3339 UTC time the hints were generated.
    pub timestamp: String,
}

impl HintResponse {
    pub fn from_outcome(outcome: HintOutcome) -> Self {
        Self {
            hint: outcome.hints,
            problem_title: outcome.problem_title,
            timestamp: format_timestamp(outcome.generated_at),
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Body of `POST /api/explain`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ExplainRequest {
    /// Conversation so far, oldest first. The last turn is the question.
    pub chat: Vec<ChatTurn>,
    /// Problem description shown to the model.
    pub problem: String,
    /// Current editor contents.
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
}
