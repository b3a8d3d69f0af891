use serde::{Deserialize, Serialize};

use crate::error::{CodehintError, Result};

/// Who sent a chat turn.
///
/// The extension tags its own replies as `"ai"`, so that spelling is accepted
/// alongside `"assistant"`. `system` turns are accepted on the wire but never
/// reach a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "ai")]
    Assistant,
    System,
}

/// One message of the conversation shown in the extension's chat window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatTurn {
    #[serde(alias = "sender")]
    pub role: ChatRole,
    #[serde(alias = "content")]
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// A chat history split into prior turns and the question being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Turns before the current question, oldest first.
    pub history: Vec<ChatTurn>,
    /// Text of the last turn.
    pub question: String,
}

impl Conversation {
    /// Drop `system` turns, then take the last remaining turn as the question.
    ///
    /// Fails with [`CodehintError::EmptyChat`] when nothing is left and with a
    /// validation error when the question is blank.
    pub fn from_turns(turns: Vec<ChatTurn>) -> Result<Self> {
        let mut history: Vec<ChatTurn> = turns
            .into_iter()
            .filter(|turn| turn.role != ChatRole::System)
            .collect();

        let last = history.pop().ok_or(CodehintError::EmptyChat)?;
        if last.text.trim().is_empty() {
            return Err(CodehintError::validation(
                "chat",
                "the last turn must contain a question",
            ));
        }

        Ok(Self {
            history,
            question: last.text,
        })
    }
}
