use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{CodehintError, ProviderFailure, Result};
use crate::llm::api::LlmApiClient;
use crate::llm::prompts::PromptMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Gemini,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

impl LlmBackend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
            Self::OpenAICompatible { .. } => "openai-compatible",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Anything that can turn a role-tagged prompt into text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier used in logs and aggregated errors, e.g. `openai/gpt-4o-mini`.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    async fn invoke(&self, messages: &[PromptMessage], options: &CompletionOptions)
        -> Result<String>;
}

/// One configured provider. The API client is built once, at construction.
#[derive(Clone)]
pub struct LlmProvider {
    name: String,
    backend: LlmBackend,
    client: Option<LlmApiClient>,
}

impl std::fmt::Debug for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProvider")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .finish()
    }
}

impl LlmProvider {
    pub fn new(config: &LlmConfig) -> Self {
        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "gemini" => LlmBackend::Gemini,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    return Self::unavailable(
                        &config.model,
                        &format!("Unknown provider in model: {}", config.model),
                    );
                }
            }
        };

        match LlmApiClient::new(config) {
            Ok(client) => {
                tracing::info!(
                    provider = %config.model,
                    backend = backend.label(),
                    base_url = %client.base_url(),
                    "LLM provider ready"
                );
                Self {
                    name: config.model.clone(),
                    backend,
                    client: Some(client),
                }
            }
            Err(error) => {
                tracing::warn!(
                    provider = %config.model,
                    error = %error,
                    "Failed to construct LLM client"
                );
                Self::unavailable(&config.model, &error.to_string())
            }
        }
    }

    pub fn unavailable(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            client: None,
        }
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn base_url(&self) -> Option<&str> {
        self.client.as_ref().map(LlmApiClient::base_url)
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client was not constructed".to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for LlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.client.is_some() && !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    async fn invoke(
        &self,
        messages: &[PromptMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        match &self.client {
            Some(client) if self.is_available() => client.complete(messages, Some(options)).await,
            _ => Err(CodehintError::LlmUnavailable(self.unavailable_reason())),
        }
    }
}

/// Availability of one provider, as reported by the health route.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProviderStatus {
    pub name: String,
    pub available: bool,
}

/// Ordered list of providers tried per call.
///
/// The first success wins. When every provider fails, the failures are
/// returned together as [`CodehintError::ProvidersExhausted`], or as
/// [`CodehintError::LlmUnavailable`] when none of them could even be called.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ChatModel>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn ChatModel>>) -> Self {
        Self { providers }
    }

    pub fn from_configs(configs: &[LlmConfig]) -> Self {
        Self::new(
            configs
                .iter()
                .map(|config| Arc::new(LlmProvider::new(config)) as Arc<dyn ChatModel>)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|provider| ProviderStatus {
                name: provider.name().to_string(),
                available: provider.is_available(),
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for ProviderChain {
    fn name(&self) -> &str {
        "provider-chain"
    }

    fn is_available(&self) -> bool {
        self.providers.iter().any(|provider| provider.is_available())
    }

    async fn invoke(
        &self,
        messages: &[PromptMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        if self.providers.is_empty() {
            return Err(CodehintError::LlmUnavailable(
                "No LLM provider configured (set LLM_MODEL)".to_string(),
            ));
        }

        let mut failures = Vec::with_capacity(self.providers.len());
        let mut attempted = false;

        for (position, provider) in self.providers.iter().enumerate() {
            // Unusable providers fail immediately with their construction error.
            attempted |= provider.is_available();
            match provider.invoke(messages, options).await {
                Ok(text) => {
                    if position > 0 {
                        tracing::info!(
                            provider = %provider.name(),
                            position,
                            "LLM call served by fallback provider"
                        );
                    }
                    return Ok(text);
                }
                Err(error) => {
                    tracing::warn!(
                        provider = %provider.name(),
                        error = %error,
                        remaining = self.providers.len() - position - 1,
                        "LLM provider failed"
                    );
                    failures.push(ProviderFailure::from_error(provider.name(), &error));
                }
            }
        }

        if attempted {
            Err(CodehintError::ProvidersExhausted(failures))
        } else {
            let reasons = failures
                .iter()
                .map(|failure| format!("[{}] {}", failure.provider, failure.message))
                .collect::<Vec<_>>()
                .join("; ");
            Err(CodehintError::LlmUnavailable(format!(
                "No usable LLM provider: {reasons}"
            )))
        }
    }
}
