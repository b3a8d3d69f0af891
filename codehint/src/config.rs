use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Non-empty string env var, trimmed.
fn env_string(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse `CORS_ALLOWED_ORIGINS`: comma-separated exact origins.
fn parse_origins(var: &str, default: &str) -> Vec<String> {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// Providers in the order they are tried; the first entry is the primary.
    pub providers: Vec<LlmConfig>,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Exact origins allowed in addition to any `chrome-extension://` origin.
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Connection settings for one chat-completion provider.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// `provider/model`, e.g. `openai/gpt-4o-mini` or `gemini/gemini-1.5-flash`.
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Sampling settings per kind of model call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub hint_temperature: f32,
    pub hint_max_tokens: u32,
    pub explain_temperature: f32,
    pub explain_max_tokens: u32,
    pub classifier_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            hint_temperature: 0.0,
            hint_max_tokens: 2012,
            explain_temperature: 0.3,
            explain_max_tokens: 1024,
            classifier_max_tokens: 4,
        }
    }
}

pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LLM_MAX_RETRIES: u32 = 2;

/// Read one provider's settings from `{prefix}_MODEL`, `{prefix}_API_KEY`
/// and `{prefix}_BASE_URL`. Timeout and retries are shared.
fn llm_config_from_env(prefix: &str) -> Option<LlmConfig> {
    env_string(&format!("{prefix}_MODEL")).map(|model| LlmConfig {
        model,
        api_key: env_string(&format!("{prefix}_API_KEY")),
        base_url: env_string(&format!("{prefix}_BASE_URL")),
        timeout_secs: parse_env_or("LLM_TIMEOUT", DEFAULT_LLM_TIMEOUT_SECS),
        max_retries: parse_env_or("LLM_MAX_RETRIES", DEFAULT_LLM_MAX_RETRIES),
    })
}

impl Default for Config {
    fn default() -> Self {
        let defaults = GenerationConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("CODEHINT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("CODEHINT_PORT", 8000),
                cors_origins: parse_origins("CORS_ALLOWED_ORIGINS", "http://localhost:3000"),
                max_body_bytes: parse_env_or("MAX_BODY_BYTES", 1024 * 1024),
                log_format: parse_env_opt("LOG_FORMAT").unwrap_or(LogFormat::Pretty),
            },
            providers: ["LLM", "LLM_FALLBACK"]
                .iter()
                .filter_map(|prefix| llm_config_from_env(prefix))
                .collect(),
            generation: GenerationConfig {
                hint_temperature: parse_env_or("HINT_TEMPERATURE", defaults.hint_temperature),
                hint_max_tokens: parse_env_or("HINT_MAX_TOKENS", defaults.hint_max_tokens),
                explain_temperature: parse_env_or(
                    "EXPLAIN_TEMPERATURE",
                    defaults.explain_temperature,
                ),
                explain_max_tokens: parse_env_or("EXPLAIN_MAX_TOKENS", defaults.explain_max_tokens),
                classifier_max_tokens: parse_env_or(
                    "CLASSIFIER_MAX_TOKENS",
                    defaults.classifier_max_tokens,
                ),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "gemini", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
