mod common;

use std::time::Duration;

use serde_json::json;
use wayfarer::config::{ApiKey, LlmConfig};
use wayfarer::{ItineraryClient, LanguageModel, PlannerError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(base_url: String, timeout: Duration) -> LlmConfig {
    LlmConfig {
        api_key: ApiKey::new("test-groq-key"),
        base_url,
        model: "llama-3.3-70b-versatile".to_string(),
        temperature: 0.7,
        max_tokens: 1024,
        timeout,
    }
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }
        ]
    })
}

fn client_for(server: &MockServer) -> ItineraryClient {
    ItineraryClient::new(llm_config(server.uri(), Duration::from_secs(5))).unwrap()
}

#[test_log::test(tokio::test)]
async fn test_generate_itinerary_sends_prompt_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-groq-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "max_tokens": 1024,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Day 1: ... Day 3: ...")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let itinerary = client.generate_itinerary(&common::paris()).await.unwrap();
    assert_eq!(itinerary.raw_text, "Day 1: ... Day 3: ...");
    assert_eq!(itinerary.source_preferences.destination, "Paris");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    for needle in ["Paris", "3-day", "art", "food"] {
        assert!(prompt.contains(needle), "prompt should mention {needle}");
    }
}

#[test_log::test(tokio::test)]
async fn test_answer_question_normalizes_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("\n| Month ∣ Crowd |\n")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client.answer_question("When should I go?").await.unwrap();
    assert_eq!(answer, "| Month | Crowd |");
}

#[test_log::test(tokio::test)]
async fn test_error_status_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid API Key", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete("hello").await.unwrap_err();
    match &err {
        PlannerError::Upstream { service, message } => {
            assert_eq!(*service, "itinerary");
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API Key"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert!(!err.user_message().contains("test-groq-key"));
}

#[test_log::test(tokio::test)]
async fn test_malformed_body_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete("hello").await.unwrap_err();
    assert!(matches!(err, PlannerError::Upstream { .. }));
}

#[test_log::test(tokio::test)]
async fn test_empty_completion_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete("hello").await.unwrap_err();
    assert!(err.to_string().contains("no completion text"));

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
        .mount(&server)
        .await;
    let err = client.complete("hello").await.unwrap_err();
    assert!(matches!(err, PlannerError::Upstream { .. }));
}

#[test_log::test(tokio::test)]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client =
        ItineraryClient::new(llm_config(server.uri(), Duration::from_millis(200))).unwrap();
    let err = client.complete("hello").await.unwrap_err();
    assert!(matches!(err, PlannerError::Timeout { service: "itinerary", .. }));
    assert!(err.is_upstream());
}
