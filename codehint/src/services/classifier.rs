use std::sync::Arc;

use crate::error::Result;
use crate::llm::{prompts, ChatModel, CompletionOptions};

/// Decides whether a chat question needs the user's code to be answered.
#[derive(Clone)]
pub struct CodeRelevanceClassifier {
    llm: Arc<dyn ChatModel>,
    options: CompletionOptions,
}

impl CodeRelevanceClassifier {
    pub fn new(llm: Arc<dyn ChatModel>, max_tokens: u32) -> Self {
        Self {
            llm,
            options: CompletionOptions::new(0.0, max_tokens),
        }
    }

    /// Ask the model for a single `1`/`0` verdict.
    ///
    /// Anything other than exactly `1` (after trimming) means "no code
    /// needed". A failed model call is returned as an error.
    pub async fn needs_code(&self, question: &str) -> Result<bool> {
        let raw = self
            .llm
            .invoke(&prompts::classifier_prompt(question), &self.options)
            .await?;

        let needs_code = parse_classifier_output(&raw);
        tracing::debug!(
            needs_code,
            raw_len = raw.len(),
            question_len = question.len(),
            "Code relevance decision"
        );
        Ok(needs_code)
    }
}

pub fn parse_classifier_output(raw: &str) -> bool {
    raw.trim() == "1"
}
