use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::llm::{prompts, ChatModel, CompletionOptions};
use crate::models::{parse_hint_output, HintSet, ProblemContext};

/// A freshly generated hint set for one problem.
#[derive(Debug, Clone)]
pub struct HintOutcome {
    pub hints: HintSet,
    /// Title from the request, not the one echoed by the model.
    pub problem_title: String,
    pub generated_at: DateTime<Utc>,
}

/// Generates all four hint levels with a single model call. Nothing is
/// cached; every call goes upstream.
#[derive(Clone)]
pub struct HintService {
    llm: Arc<dyn ChatModel>,
    options: CompletionOptions,
}

impl HintService {
    pub fn new(llm: Arc<dyn ChatModel>, generation: &GenerationConfig) -> Self {
        Self {
            llm,
            options: CompletionOptions::new(generation.hint_temperature, generation.hint_max_tokens),
        }
    }

    pub async fn generate(&self, problem: &ProblemContext) -> Result<HintOutcome> {
        tracing::info!(
            problem_id = %problem.id,
            title = %problem.title,
            difficulty = %problem.difficulty,
            "Generating hints"
        );

        let raw = self
            .llm
            .invoke(&prompts::hint_prompt(problem), &self.options)
            .await?;
        let generated = parse_hint_output(&raw)?;

        if generated.problem_title != problem.title {
            tracing::debug!(
                model_title = %generated.problem_title,
                "Model echoed a different problem title"
            );
        }

        Ok(HintOutcome {
            hints: generated.hints,
            problem_title: problem.title.clone(),
            generated_at: Utc::now(),
        })
    }
}
