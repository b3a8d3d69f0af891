mod api;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use prompts::{PromptMessage, PromptRole, PromptVariant};
pub use provider::{
    ChatModel, CompletionOptions, LlmBackend, LlmProvider, ProviderChain, ProviderStatus,
};
