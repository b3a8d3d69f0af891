// Common test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::Router;

use codehint::api::{create_router, AppState};
use codehint::config::{Config, GenerationConfig, LogFormat, ServerConfig};
use codehint::error::{CodehintError, Result};
use codehint::llm::{ChatModel, CompletionOptions, PromptMessage, ProviderChain};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// One prompt received by a [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<PromptMessage>,
    pub options: CompletionOptions,
}

impl RecordedCall {
    /// All message contents joined, for substring checks.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

/// Model that replays queued replies in order and records every prompt.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn reply(self: &Arc<Self>, text: &str) -> Arc<Self> {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back(Ok(text.to_string()));
        Arc::clone(self)
    }

    pub fn fail(self: &Arc<Self>, error: CodehintError) -> Arc<Self> {
        self.replies.lock().expect("replies lock").push_back(Err(error));
        Arc::clone(self)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted/test-model"
    }

    async fn invoke(
        &self,
        messages: &[PromptMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            messages: messages.to_vec(),
            options: options.clone(),
        });
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(CodehintError::Llm("no scripted reply left".to_string())))
    }
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_body_bytes: 64 * 1024,
            log_format: LogFormat::Pretty,
        },
        providers: Vec::new(),
        generation: GenerationConfig::default(),
    }
}

pub fn router_with_chain(chain: ProviderChain) -> Router {
    init_test_logger();
    create_router(AppState::new(test_config(), chain))
}

pub fn router_with(model: &Arc<ScriptedModel>) -> Router {
    router_with_chain(ProviderChain::new(vec![
        Arc::clone(model) as Arc<dyn ChatModel>
    ]))
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("response is JSON")
}

pub const VALID_HINTS: &str = r#"{
  "problem_title": "Two Sum",
  "hints": {
    "1": "What do you need to remember about numbers you've already seen?",
    "2": "A hash map gives constant-time lookups.",
    "3": "For each number, look up target minus that number before inserting it.",
    "4": "Store indices; don't pair an element with itself. O(n) time, O(n) space."
  }
}"#;

pub fn two_sum_problem() -> serde_json::Value {
    serde_json::json!({
        "title": "Two Sum",
        "difficulty": "Easy",
        "description": "Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.",
        "id": "two-sum"
    })
}
