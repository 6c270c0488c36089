//! HTTP-level tests: drive the full router in-process with `oneshot` and
//! check status codes, SSE framing, and JSON response shapes.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use hrychat_chat::{ChatChunk, ChatPipeline, CitationTable, MockProvider, Provider};
use hrychat_core::AppConfig;
use hrychat_server::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const FIRST: &str = "See the report [^1] and [[技术报告]] for details.";
const SECOND: &str = "Plain answer with no references.";

fn mock_app() -> Router {
    let provider = MockProvider::with_responses(vec![FIRST.into(), SECOND.into()]).with_delay(0..=0);
    let pipeline = ChatPipeline::new(Provider::Mock(provider), Some(CitationTable::builtin()));
    build_router(Arc::new(AppState::with_pipeline(AppConfig::default(), pipeline)))
}

fn chat_body(temperature: f64) -> Value {
    json!({
        "messages": [
            { "id": "m1", "role": "user", "content": "hello", "created_at": "2024-05-01T10:00:00Z" }
        ],
        "temperature": temperature,
    })
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Split an SSE body into (event name, data) pairs, skipping comments.
fn parse_sse(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    name = Some(rest.trim_start().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data = Some(rest.trim_start().to_string());
                }
            }
            Some((name.unwrap_or_else(|| "message".into()), data?))
        })
        .collect()
}

// ---------------------------------------------------------------
// Chat
// ---------------------------------------------------------------

#[tokio::test]
async fn test_chat_stream_framing() {
    let app = mock_app();
    let response = app
        .oneshot(json_request(Method::POST, "/api/chat", &chat_body(0.7)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let events = parse_sse(&body_text(response).await);
    assert!(events.len() > 1);
    assert!(events.iter().all(|(name, _)| name == "message"));

    let chunks: Vec<ChatChunk> = events
        .iter()
        .map(|(_, data)| serde_json::from_str(data).unwrap())
        .collect();
    let (last, fragments) = chunks.split_last().unwrap();

    assert!(fragments.iter().all(|c| !c.done && c.message_id.is_none()));
    let text: String = fragments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(text, FIRST);

    assert!(last.done);
    assert!(last.content.is_empty());
    assert!(last.message_id.as_deref().is_some_and(|id| !id.is_empty()));
    let ids: Vec<String> = last
        .citations
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(ids, vec!["1", "tech-report"]);
}

#[tokio::test]
async fn test_chat_rejects_out_of_range_temperature() {
    let app = mock_app();
    let response = app
        .oneshot(json_request(Method::POST, "/api/chat", &chat_body(3.0)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("temperature"));
}

#[tokio::test]
async fn test_complete_uses_round_robin() {
    let app = mock_app();

    let first = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/chat/complete", &chat_body(0.7)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["role"], "assistant");
    assert_eq!(first["content"], FIRST);
    assert_eq!(first["citations"].as_array().unwrap().len(), 2);

    let second = app
        .oneshot(json_request(Method::POST, "/api/chat/complete", &chat_body(0.7)))
        .await
        .unwrap();
    let second = body_json(second).await;
    assert_eq!(second["content"], SECOND);
    assert_eq!(second["citations"], json!([]));
}

#[tokio::test]
async fn test_network_failure_ends_with_error_event() {
    let config = AppConfig {
        mock_mode: false,
        provider: "openai".into(),
        api_key: "test-key".into(),
        base_url: Some("http://127.0.0.1:1".into()),
        ..AppConfig::default()
    };
    let app = build_router(Arc::new(AppState::new(config).unwrap()));

    let response = app
        .oneshot(json_request(Method::POST, "/api/chat", &chat_body(0.7)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = parse_sse(&body_text(response).await);
    assert_eq!(events.len(), 1);
    let (name, data) = &events[0];
    assert_eq!(name, "error");
    let payload: Value = serde_json::from_str(data).unwrap();
    assert!(payload["error"].as_str().unwrap().contains("Request failed"));
}

// ---------------------------------------------------------------
// Config and health
// ---------------------------------------------------------------

#[tokio::test]
async fn test_config_hides_secrets() {
    let config = AppConfig {
        api_key: "sk-secret".into(),
        ..AppConfig::default()
    };
    let app = build_router(Arc::new(AppState::new(config).unwrap()));

    let response = app.oneshot(get("/api/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(!text.contains("sk-secret"));

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["mock_mode"], true);
    assert_eq!(body["app_name"], "HRY Chat");
    assert!(body["model"].is_string());
}

#[tokio::test]
async fn test_health_routes() {
    let app = mock_app();

    let health = body_json(app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["status"], "healthy");

    let root = body_json(app.oneshot(get("/")).await.unwrap()).await;
    assert_eq!(root["message"], "Welcome to HRY Chat");
    assert_eq!(root["mock_mode"], true);
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = mock_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

// ---------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------

#[tokio::test]
async fn test_conversation_lifecycle() {
    let app = mock_app();

    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/conversations",
            &json!({ "id": "c1", "messages": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let created = body_json(created).await;
    assert_eq!(created["id"], "c1");
    assert_eq!(created["title"], "新对话");

    let replaced = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/conversations/c1",
            &json!({ "id": "c1", "title": "Renamed" }),
        ))
        .await
        .unwrap();
    assert_eq!(replaced.status(), StatusCode::OK);

    let listed = body_json(app.clone().oneshot(get("/api/conversations")).await.unwrap()).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Renamed");

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/conversations/c1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body_json(deleted).await["message"], "Conversation deleted");

    let missing = app.oneshot(get("/api/conversations/c1")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(body_json(missing).await["error"].is_string());
}

#[tokio::test]
async fn test_missing_conversation_updates_are_not_found() {
    let app = mock_app();

    let put = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/conversations/ghost",
            &json!({ "id": "ghost" }),
        ))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::NOT_FOUND);

    let delete = app
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/conversations/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() {
    let app = mock_app();

    let bad_role = json!({
        "messages": [{ "id": "m1", "role": "robot", "content": "hello" }],
    });
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/chat", &bad_role))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());

    let negative_tokens = json!({
        "messages": [{ "id": "m1", "role": "user", "content": "hello" }],
        "max_tokens": -5,
    });
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/chat/complete", &negative_tokens))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/conversations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());
}
