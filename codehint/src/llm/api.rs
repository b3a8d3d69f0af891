use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{CodehintError, Result},
    llm::prompts::{PromptMessage, PromptRole},
    llm::provider::CompletionOptions,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

/// Chat-completion client for one OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(CodehintError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                CodehintError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 5xx responses on its own with exponential
        // backoff for up to 15 minutes unless capped; bound it by our timeout.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Model name as sent to the endpoint (provider prefix removed).
    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn complete(
        &self,
        messages: &[PromptMessage],
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if messages.iter().all(|message| message.content.trim().is_empty()) {
            return Err(CodehintError::Validation {
                message: "Prompt cannot be empty".to_string(),
                fields: Vec::new(),
            });
        }

        let mut last_error: Option<CodehintError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request = self.build_request(messages, options)?;

            match self.client.chat().create(request).await {
                Ok(response) => {
                    let content = Self::extract_content(response)?;
                    tracing::debug!(
                        model = %self.config.model,
                        attempt,
                        response_len = content.len(),
                        "LLM response received"
                    );
                    return Ok(content);
                }
                Err(error) => {
                    let kind = classify_failure(&error);
                    let mapped_error = failure_to_error(kind, error);

                    if kind == FailureKind::Transient && attempt < self.config.max_retries {
                        tracing::debug!(
                            model = %self.config.model,
                            attempt,
                            error = %mapped_error,
                            "Retrying LLM request"
                        );
                        last_error = Some(mapped_error);
                        continue;
                    }

                    return Err(mapped_error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CodehintError::Llm("LLM completion failed after retries".to_string())
        }))
    }

    fn build_request(
        &self,
        messages: &[PromptMessage],
        options: Option<&CompletionOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.config.model.clone()).messages(messages);
        Self::apply_completion_options(&mut request, options);

        request
            .build()
            .map_err(|error| CodehintError::Internal(format!("Invalid LLM completion request: {error}")))
    }

    fn to_request_message(message: &PromptMessage) -> Result<ChatCompletionRequestMessage> {
        let content = message.content.clone();
        let built: std::result::Result<ChatCompletionRequestMessage, OpenAIError> =
            match message.role {
                PromptRole::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(content)
                    .build()
                    .map(Into::into),
                PromptRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()
                    .map(Into::into),
                PromptRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content)
                    .build()
                    .map(Into::into),
            };

        built.map_err(|error| {
            CodehintError::Internal(format!("Invalid {:?} prompt message: {error}", message.role))
        })
    }

    fn apply_completion_options(
        request: &mut CreateChatCompletionRequestArgs,
        options: Option<&CompletionOptions>,
    ) {
        let Some(options) = options else {
            return;
        };

        if let Some(temperature) = options.temperature {
            request.temperature(temperature);
        }

        if let Some(max_tokens) = options.max_tokens {
            request.max_tokens(max_tokens);
        }
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CodehintError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(CodehintError::Llm(
                "LLM response contained empty content".to_string(),
            ));
        }

        Ok(message)
    }
}

/// How a failed completion call is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// 429 or quota exhaustion. Returned as-is so the chain can move on.
    RateLimited,
    /// 401/403 or a rejected key. Retrying cannot help.
    Auth,
    /// 5xx, transport failures, or an API error with no type or code.
    Transient,
    Fatal,
}

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "too many requests",
    "resource has been exhausted",
    "resource_exhausted",
    "insufficient_quota",
];

const AUTH_MARKERS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "authentication",
    "invalid api key",
    "invalid_api_key",
    "api key not valid",
];

fn classify_failure(error: &OpenAIError) -> FailureKind {
    match error {
        OpenAIError::Reqwest(reqwest_error) => match reqwest_error.status() {
            Some(status) if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                FailureKind::RateLimited
            }
            Some(status)
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                FailureKind::Auth
            }
            Some(status) if status.is_server_error() => FailureKind::Transient,
            Some(_) => FailureKind::Fatal,
            None => FailureKind::Transient,
        },
        OpenAIError::ApiError(api_error) => classify_api_error(api_error),
        _ => FailureKind::Fatal,
    }
}

/// async-openai folds the HTTP status into a parsed error body, so the kind
/// is recovered from the body's message, type and code.
fn classify_api_error(api_error: &ApiError) -> FailureKind {
    let text = format!(
        "{} {} {}",
        api_error.message,
        api_error.r#type.as_deref().unwrap_or_default(),
        api_error.code.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    let mentions = |markers: &[&str]| markers.iter().any(|marker| text.contains(marker));

    if mentions(RATE_LIMIT_MARKERS) {
        FailureKind::RateLimited
    } else if mentions(AUTH_MARKERS) {
        FailureKind::Auth
    } else if api_error.r#type.is_none() && api_error.code.is_none() {
        FailureKind::Transient
    } else {
        FailureKind::Fatal
    }
}

fn failure_to_error(kind: FailureKind, error: OpenAIError) -> CodehintError {
    match (kind, error) {
        (FailureKind::RateLimited, _) => CodehintError::LlmRateLimit { retry_after: None },
        (FailureKind::Auth, error) => {
            CodehintError::Llm(format!("LLM authentication failed: {error}"))
        }
        (_, OpenAIError::Reqwest(error)) => CodehintError::Llm(format!("LLM request failed: {error}")),
        (_, OpenAIError::ApiError(error)) => CodehintError::Llm(format!("LLM API error: {error}")),
        (_, OpenAIError::JSONDeserialize(error)) => {
            CodehintError::Llm(format!("Failed to parse LLM response: {error}"))
        }
        (_, other) => CodehintError::Llm(other.to_string()),
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_BASE_URL,
        "openrouter" => OPENROUTER_BASE_URL,
        "gemini" => GEMINI_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}
