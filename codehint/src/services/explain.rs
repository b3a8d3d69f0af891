use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::llm::prompts::{self, ExplainInput, PromptVariant};
use crate::llm::{ChatModel, CompletionOptions};
use crate::models::{ChatTurn, Conversation};

use super::classifier::CodeRelevanceClassifier;

/// The assistant's reply to the latest chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    pub variant: PromptVariant,
}

/// Answers chat questions about a problem, attaching the user's code only
/// when the classifier says the question needs it.
#[derive(Clone)]
pub struct ExplainService {
    llm: Arc<dyn ChatModel>,
    classifier: CodeRelevanceClassifier,
    options: CompletionOptions,
}

impl ExplainService {
    pub fn new(llm: Arc<dyn ChatModel>, generation: &GenerationConfig) -> Self {
        Self {
            classifier: CodeRelevanceClassifier::new(
                Arc::clone(&llm),
                generation.classifier_max_tokens,
            ),
            llm,
            options: CompletionOptions::new(
                generation.explain_temperature,
                generation.explain_max_tokens,
            ),
        }
    }

    pub async fn explain(&self, chat: Vec<ChatTurn>, problem: &str, code: &str) -> Result<Explanation> {
        let conversation = Conversation::from_turns(chat)?;

        let needs_code = self.classifier.needs_code(&conversation.question).await?;
        let variant = prompts::select_variant(needs_code);

        tracing::info!(
            history_len = conversation.history.len(),
            code_len = code.len(),
            ?variant,
            "Generating explanation"
        );

        let messages = prompts::explain_prompt(
            variant,
            &ExplainInput {
                problem,
                history: &conversation.history,
                question: &conversation.question,
                code,
            },
        );

        let text = self.llm.invoke(&messages, &self.options).await?;
        Ok(Explanation { text, variant })
    }
}
