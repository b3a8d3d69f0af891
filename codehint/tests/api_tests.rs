mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

use codehint::error::CodehintError;
use codehint::llm::{PromptRole, ProviderChain};

use common::{
    json_request, read_json, router_with, router_with_chain, two_sum_problem, ScriptedModel,
    VALID_HINTS,
};

// ---------------------------------------------------------------------------
// POST /api/hint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hint_returns_all_four_levels() {
    let model = ScriptedModel::new().reply(VALID_HINTS);
    let app = router_with(&model);
    let started = Utc::now();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem(), "hint_level": 2}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    for level in ["1", "2", "3", "4"] {
        let text = body["hint"][level].as_str().unwrap_or_default();
        assert!(!text.trim().is_empty(), "hint level {level} should be present");
    }
    assert_eq!(body["problem_title"], "Two Sum");

    let timestamp = body["timestamp"].as_str().expect("timestamp string");
    let generated: DateTime<Utc> = DateTime::parse_from_rfc3339(timestamp)
        .expect("RFC 3339 timestamp")
        .with_timezone(&Utc);
    assert!(generated >= started, "{generated} should not precede {started}");
}

#[tokio::test]
async fn test_hint_timestamp_never_precedes_request_start() {
    const REQUESTS: usize = 25;
    let model = ScriptedModel::new();
    for _ in 0..REQUESTS {
        model.reply(VALID_HINTS);
    }
    let app = router_with(&model);

    for _ in 0..REQUESTS {
        let started = Utc::now();
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/hint",
                json!({"problem_data": two_sum_problem(), "hint_level": 1}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        let timestamp = body["timestamp"].as_str().expect("timestamp string");
        let generated = DateTime::parse_from_rfc3339(timestamp)
            .expect("RFC 3339 timestamp")
            .with_timezone(&Utc);
        assert!(generated >= started, "{generated} should not precede {started}");
    }
}

#[tokio::test]
async fn test_hint_prompt_carries_problem_and_sampling_options() {
    let model = ScriptedModel::new().reply(VALID_HINTS);
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.messages.len(), 2);
    assert_eq!(call.messages[0].role, PromptRole::System);
    assert!(call.messages[1].content.contains("Problem Title: Two Sum"));
    assert!(call.messages[1].content.contains("Difficulty: Easy"));
    assert_eq!(call.options.temperature, Some(0.0));
    assert_eq!(call.options.max_tokens, Some(2012));
}

#[tokio::test]
async fn test_hint_accepts_fenced_json() {
    let fenced = format!("```json\n{VALID_HINTS}\n```");
    let model = ScriptedModel::new().reply(&fenced);
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_hint_malformed_output_is_bad_gateway() {
    let model = ScriptedModel::new().reply("Sure! Think about hash maps.");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to generate hint");
    assert_eq!(body["code"], "malformed_model_output");
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn test_hint_missing_level_is_bad_gateway() {
    let model = ScriptedModel::new()
        .reply(r#"{"problem_title": "Two Sum", "hints": {"1": "a", "2": "b", "3": "c"}}"#);
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert!(body["details"]
        .as_str()
        .unwrap_or_default()
        .contains("missing hint level 4"));
}

#[tokio::test]
async fn test_identical_hint_requests_each_call_upstream() {
    let model = ScriptedModel::new().reply(VALID_HINTS).reply(VALID_HINTS);
    let app = router_with(&model);
    let body = json!({"problem_data": two_sum_problem(), "hint_level": 1});

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/hint", body.clone()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn test_hint_upstream_failure_is_bad_gateway() {
    let model = ScriptedModel::new().fail(CodehintError::Llm("connection reset".to_string()));
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["code"], "upstream_error");
    assert!(body["details"]
        .as_str()
        .unwrap_or_default()
        .contains("connection reset"));
}

#[tokio::test]
async fn test_hint_rate_limited_everywhere_is_429() {
    let model = ScriptedModel::new().fail(CodehintError::LlmRateLimit {
        retry_after: Some(5),
    });
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(read_json(response).await["code"], "rate_limited");
}

#[tokio::test]
async fn test_hint_without_providers_is_service_unavailable() {
    let app = router_with_chain(ProviderChain::default());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": two_sum_problem()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(response).await["code"], "provider_unavailable");
}

#[tokio::test]
async fn test_hint_validation_lists_fields() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let mut problem = two_sum_problem();
    problem["title"] = json!("   ");

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": problem, "hint_level": 9}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["code"], "validation_failed");

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("fields array")
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["hint_level", "problem_data.title"]);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_hint_missing_problem_field_is_unprocessable() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/hint",
            json!({"problem_data": {"title": "Two Sum", "difficulty": "Easy", "id": "1"}}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["fields"][0]["field"], "problem_data.description");
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/hint")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"problem_data\": "))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "invalid_request");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let padding = "x".repeat(128 * 1024);
    let body = json!({"chat": [{"role": "user", "text": padding}], "problem": "Two Sum"}).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/explain")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(model.calls().is_empty());
}

// ---------------------------------------------------------------------------
// POST /api/explain
// ---------------------------------------------------------------------------

const USER_CODE: &str = "def twoSum(nums, target):\n    for i in range(len(nums)):\n        pass";

fn explain_body(question: &str) -> serde_json::Value {
    json!({
        "chat": [
            {"sender": "ai", "text": "Hi! Ask me anything about this problem."},
            {"sender": "user", "text": "what pattern is this?"},
            {"sender": "ai", "text": "It's a lookup problem."},
            {"sender": "user", "text": question}
        ],
        "problem": "Two Sum: return indices of two numbers adding to target.",
        "code": USER_CODE
    })
}

#[tokio::test]
async fn test_explain_classifies_the_question() {
    let model = ScriptedModel::new().reply("0").reply("Hello! How can I help?");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            json!({"chat": [{"role": "user", "text": "hi"}], "problem": "Two Sum"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"explanation": "Hello! How can I help?"})
    );

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    let classifier = &calls[0];
    assert_eq!(
        classifier.messages.last().map(|m| m.content.as_str()),
        Some("Question: hi")
    );
    assert_eq!(classifier.options.temperature, Some(0.0));
    assert_eq!(classifier.options.max_tokens, Some(4));
}

#[tokio::test]
async fn test_explain_without_code_when_classifier_says_zero() {
    let model = ScriptedModel::new().reply("0").reply("Think about complements.");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            explain_body("what is the time complexity?"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let answer = &model.calls()[1];
    assert!(!answer.transcript().contains(USER_CODE));
    assert!(!answer.transcript().contains("My code:"));
    assert_eq!(answer.options.temperature, Some(0.3));
    assert_eq!(answer.options.max_tokens, Some(1024));
}

#[tokio::test]
async fn test_explain_without_code_when_classifier_is_verbose() {
    let model = ScriptedModel::new()
        .reply("1 - the user is asking about their code")
        .reply("Your loop never returns.");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            explain_body("why does my solution fail?"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!model.calls()[1].transcript().contains(USER_CODE));
}

#[tokio::test]
async fn test_explain_with_code_when_classifier_says_one() {
    let model = ScriptedModel::new().reply("1").reply("Your loop never returns.");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            explain_body("why does my solution fail?"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let answer = &model.calls()[1];
    let last = answer.messages.last().expect("question message");
    assert_eq!(last.role, PromptRole::User);
    assert!(last.content.starts_with("why does my solution fail?"));
    assert!(last.content.contains(USER_CODE));
}

#[tokio::test]
async fn test_explain_history_excludes_current_question() {
    let model = ScriptedModel::new().reply("0").reply("Use a hash map.");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            explain_body("which data structure?"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let answer = &model.calls()[1];
    let roles: Vec<PromptRole> = answer.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            PromptRole::System,
            PromptRole::Assistant,
            PromptRole::User,
            PromptRole::Assistant,
            PromptRole::User,
        ]
    );
    let mentions = answer
        .messages
        .iter()
        .filter(|m| m.content.contains("which data structure?"))
        .count();
    assert_eq!(mentions, 1);
    assert!(answer.messages[0].content.contains("Two Sum"));
}

#[tokio::test]
async fn test_explain_drops_system_turns() {
    let model = ScriptedModel::new().reply("0").reply("Sure.");
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            json!({
                "chat": [
                    {"sender": "system", "content": "Local greeting", "id": 1},
                    {"sender": "user", "content": "explain the problem", "id": 2}
                ],
                "problem": "Two Sum"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let answer = &model.calls()[1];
    assert_eq!(answer.messages.len(), 2);
    assert!(!answer.transcript().contains("Local greeting"));
}

#[tokio::test]
async fn test_explain_empty_chat_is_unprocessable() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            json!({"chat": [], "problem": "Two Sum", "code": ""}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to generate explanation");
    assert_eq!(body["fields"][0]["field"], "chat");
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_explain_classifier_failure_is_internal_error() {
    let model = ScriptedModel::new().fail(CodehintError::Llm("timeout".to_string()));
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            explain_body("why does my solution fail?"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to generate explanation");
    assert!(body["details"].as_str().unwrap_or_default().contains("timeout"));
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn test_explain_answer_failure_is_internal_error() {
    let model = ScriptedModel::new()
        .reply("0")
        .fail(CodehintError::LlmRateLimit { retry_after: None });
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            explain_body("hint please"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to generate explanation");
    assert_eq!(body["code"], "rate_limited");
}

#[tokio::test]
async fn test_explain_missing_chat_is_unprocessable() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/explain",
            json!({"problem": "Two Sum"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["fields"][0]["field"], "chat");
}

// ---------------------------------------------------------------------------
// Liveness, docs, CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_root_banner() {
    let app = router_with(&ScriptedModel::new());

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"message": "LeetCode AI Assistant API"})
    );
}

#[tokio::test]
async fn test_health_lists_providers_without_calling_them() {
    let model = ScriptedModel::new();
    let app = router_with(&model);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(
        body["providers"],
        json!([{"name": "scripted/test-model", "available": true}])
    );
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = router_with(&ScriptedModel::new());

    let response = app
        .oneshot(
            Request::get("/api/openapi.json")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["paths"]["/api/hint"]["post"].is_object());
    assert!(body["paths"]["/api/explain"]["post"].is_object());
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/hint")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn test_cors_allows_extension_origin_with_credentials() {
    let app = router_with(&ScriptedModel::new());
    let origin = "chrome-extension://abcdefghijklmnopabcdefghijklmnop";

    let response = app.oneshot(preflight(origin)).await.expect("response");

    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(origin)
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|v| v.to_str().ok()),
        Some("POST")
    );
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let app = router_with(&ScriptedModel::new());

    let response = app
        .oneshot(preflight("https://example.com"))
        .await
        .expect("response");

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
