//! Completion client tests against a mock OpenAI-compatible endpoint.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use veritus_discovery::config::Config;
use veritus_discovery::error::CompletionError;
use veritus_discovery::CompletionClient;

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn test_summary_request_and_cache() {
    let server = MockServer::start().await;
    let client = CompletionClient::new(&Config::for_testing(&server.uri())).unwrap();

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer test-completion-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "max_tokens": 200
        })))
        .respond_with(reply("  Transformers replace recurrence with attention.  "))
        .expect(1)
        .mount(&server)
        .await;

    let first = client.summarize("Attention Is All You Need", Some("We propose...")).await.unwrap();
    let second = client.summarize("Attention Is All You Need", Some("We propose...")).await.unwrap();

    assert_eq!(first, "Transformers replace recurrence with attention.");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_review_uses_larger_budget() {
    let server = MockServer::start().await;
    let client = CompletionClient::new(&Config::for_testing(&server.uri())).unwrap();

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 2000})))
        .respond_with(reply("## Research Problem\n..."))
        .expect(2)
        .mount(&server)
        .await;

    // Reviews are not cached.
    for _ in 0..2 {
        let review = client.review("Mamba", None, "Gu, Albert").await.unwrap();
        assert!(review.starts_with("## Research Problem"));
    }
}

#[tokio::test]
async fn test_empty_choices_is_error() {
    let server = MockServer::start().await;
    let client = CompletionClient::new(&Config::for_testing(&server.uri())).unwrap();

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client.summarize("Untitled", None).await.unwrap_err();
    assert!(matches!(err, CompletionError::Empty));
}

#[tokio::test]
async fn test_api_error_message_is_extracted() {
    let server = MockServer::start().await;
    let client = CompletionClient::new(&Config::for_testing(&server.uri())).unwrap();

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Invalid API Key"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    match client.summarize("T", None).await.unwrap_err() {
        CompletionError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("unexpected: {other:?}"),
    }
}
