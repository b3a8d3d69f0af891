//! Prompt templates for hint generation, explanations and the
//! code-relevance classifier.
//!
//! Templates use plain `format!()` interpolation, so a missing variable is a
//! compile error rather than a runtime surprise.

use serde::Serialize;

use crate::models::{ChatRole, ChatTurn, ProblemContext};

/// Sender of a prompt message as seen by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message sent to a chat-completion model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatTurn> for PromptMessage {
    fn from(turn: &ChatTurn) -> Self {
        match turn.role {
            ChatRole::User => Self::user(turn.text.clone()),
            ChatRole::Assistant => Self::assistant(turn.text.clone()),
            ChatRole::System => Self::system(turn.text.clone()),
        }
    }
}

pub const HINT_SYSTEM_PROMPT: &str = r#"You are a helpful coding tutor. Provide progressive hints for a programming problem. Never give away the full solution.
Hint levels:
1 = Give a conceptual hint about the general approach or pattern needed. Don't mention specific algorithms or data structures yet. Focus on the key insight that leads to the solution.
2 = Suggest the specific algorithm, data structure, or technique to use. Explain why this approach is suitable for this problem type.
3 = Provide a step-by-step outline of the solution approach. Break down the algorithm into clear steps without giving code.
4 = Give implementation hints including edge cases to consider, time/space complexity, and common pitfalls to avoid.
Respond ONLY with a valid JSON object in this format:
{"problem_title": "<title>", "hints": {"1": "<hint1>", "2": "<hint2>", "3": "<hint3>", "4": "<hint4>"}}"#;

/// Build the two-message hint prompt: fixed instructions plus the problem.
///
/// # Example
/// ```
/// use codehint::llm::prompts::hint_prompt;
/// use codehint::models::ProblemContext;
///
/// let problem = ProblemContext {
///     title: "Two Sum".to_string(),
///     difficulty: "Easy".to_string(),
///     description: "Return indices of the two numbers that add up to target.".to_string(),
///     id: "two-sum".to_string(),
/// };
/// let messages = hint_prompt(&problem);
/// assert_eq!(messages.len(), 2);
/// assert!(messages[1].content.contains("Two Sum"));
/// ```
pub fn hint_prompt(problem: &ProblemContext) -> Vec<PromptMessage> {
    let ProblemContext {
        title,
        difficulty,
        description,
        ..
    } = problem;

    vec![
        PromptMessage::system(HINT_SYSTEM_PROMPT),
        PromptMessage::user(format!(
            r#"Problem Title: {title}
Difficulty: {difficulty}
Description: {description}

Give all level hints for this problem: levels 1, 2, 3 and 4."#
        )),
    ]
}

/// Which explanation template to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVariant {
    /// The model is told to analyze the user's code, which is attached.
    WithCode,
    /// No code is attached and code analysis is never mentioned.
    WithoutCode,
}

/// Map the classifier's decision to a template.
pub fn select_variant(needs_code: bool) -> PromptVariant {
    if needs_code {
        PromptVariant::WithCode
    } else {
        PromptVariant::WithoutCode
    }
}

/// Inputs to an explanation prompt.
#[derive(Debug, Clone, Copy)]
pub struct ExplainInput<'a> {
    /// Free-form problem description sent by the extension.
    pub problem: &'a str,
    /// Prior turns, oldest first. Never contains the current question.
    pub history: &'a [ChatTurn],
    pub question: &'a str,
    /// The user's editor contents. Only used by [`PromptVariant::WithCode`].
    pub code: &'a str,
}

fn explain_system_prompt(variant: PromptVariant, problem: &str) -> String {
    match variant {
        PromptVariant::WithCode => format!(
            r#"You are a helpful coding tutor chatting with a student about a programming problem.
The student has shared their current code. Analyze it to answer the question: point out bugs, explain behavior, and suggest improvements without rewriting the full solution.
Keep answers concise and use Markdown for code.

Problem:
{problem}"#
        ),
        PromptVariant::WithoutCode => format!(
            r#"You are a helpful coding tutor chatting with a student about a programming problem.
Answer the student's question clearly and guide them toward the solution without giving it away.
Keep answers concise and use Markdown for code.

Problem:
{problem}"#
        ),
    }
}

fn explain_question_message(variant: PromptVariant, question: &str, code: &str) -> String {
    match variant {
        PromptVariant::WithCode if !code.trim().is_empty() => format!(
            r#"{question}

My code:
```
{code}
```"#
        ),
        PromptVariant::WithCode => format!("{question}\n\n(I have not written any code yet.)"),
        PromptVariant::WithoutCode => question.to_string(),
    }
}

/// Build an explanation prompt: system context, prior turns in order, then
/// the current question (with the code when the variant asks for it).
pub fn explain_prompt(variant: PromptVariant, input: &ExplainInput<'_>) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(input.history.len() + 2);
    messages.push(PromptMessage::system(explain_system_prompt(
        variant,
        input.problem,
    )));
    messages.extend(
        input
            .history
            .iter()
            .filter(|turn| turn.role != ChatRole::System)
            .map(PromptMessage::from),
    );
    messages.push(PromptMessage::user(explain_question_message(
        variant,
        input.question,
        input.code,
    )));
    messages
}

pub const CLASSIFIER_SYSTEM_PROMPT: &str = r#"You decide whether answering a student's question about a programming problem requires looking at the student's own code.
Reply with a single character and nothing else:
1 = the question is about their code (debugging, reviewing, "why does my solution fail", "fix this")
0 = the question can be answered without their code (concepts, approach, complexity, clarifying the problem)
Do not explain your answer."#;

/// Build the classifier prompt for a single question.
pub fn classifier_prompt(question: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(CLASSIFIER_SYSTEM_PROMPT),
        PromptMessage::user(format!("Question: {question}")),
    ]
}
