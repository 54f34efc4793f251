//! Wire-level tests for the OpenAI engine against a mock server.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scribe::config::EngineConfig;
use scribe::engine::{EngineError, OpenAIEngine, ReasoningEngine};
use scribe::memory::Turn;

fn engine_for(server: &MockServer) -> OpenAIEngine {
    let cfg = EngineConfig::default();
    OpenAIEngine::with_endpoint(
        &cfg,
        "sk-test".to_string(),
        format!("{}/v1/chat/completions", server.uri()),
    )
    .unwrap()
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn complete_returns_trimmed_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  hello there \n")))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let reply = engine.complete(&[], "hi").await.unwrap();
    assert_eq!(reply, "hello there");
}

#[tokio::test]
async fn request_carries_sampling_parameters_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let context = vec![Turn::exchange("hi", "hello")];
    engine.complete(&context, "how are you?").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(body["model"], "gpt-4o-mini");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(body["max_tokens"], 512);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["content"], "hi");
    assert_eq!(messages[2]["content"], "hello");
    assert_eq!(messages.last().unwrap()["content"], "how are you?");
}

#[tokio::test]
async fn non_success_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    match engine.complete(&[], "hi").await {
        Err(EngineError::Api { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_completion_maps_to_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("")))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    assert!(matches!(
        engine.complete(&[], "hi").await,
        Err(EngineError::Malformed(_))
    ));
}

#[tokio::test]
async fn missing_choices_maps_to_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    assert!(matches!(
        engine.complete(&[], "hi").await,
        Err(EngineError::Malformed(_))
    ));
}

#[tokio::test]
async fn non_json_body_maps_to_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    assert!(matches!(
        engine.complete(&[], "hi").await,
        Err(EngineError::Malformed(_))
    ));
}
