//! Real HTTP round-trips through `ReqwestTransport` against wiremock
//! servers speaking each provider dialect.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use switchyard::providers::{
    Capabilities, HttpRequest, ProviderDescriptor, ProviderKind, ReqwestTransport, Transport,
};
use switchyard::{RequestGateway, RequestOptions, Switchyard, SwitchyardError};

fn fast(descriptor: ProviderDescriptor) -> ProviderDescriptor {
    descriptor
        .retry_budget(1)
        .base_delay(Duration::from_millis(10))
        .timeout(Duration::from_secs(5))
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fail"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let response = transport
        .send(HttpRequest::post(format!("{}/fail", server.uri()), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.body, "overloaded");
    assert!(!response.is_success());
}

#[tokio::test]
async fn headers_and_json_body_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-probe", "1"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({ "hello": "world" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let request = HttpRequest::post(format!("{}/echo", server.uri()), json!({ "hello": "world" }))
        .header("x-probe", "1");
    let response = transport.send(request).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let transport = ReqwestTransport::new().unwrap();
    let err = transport
        .send(HttpRequest::post("http://127.0.0.1:1/nowhere", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::Transport(_)));
}

// ============================================================================
// Dialects end to end
// ============================================================================

#[tokio::test]
async fn openai_dialect_extracts_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": {
                "role": "assistant",
                "content": "{\"high\": [\"Rust\"], \"medium\": [\"Tokio\"], \"low\": [\"Nix\"]}"
            }}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Switchyard::builder()
        .provider(fast(
            ProviderDescriptor::new(
                "openai",
                ProviderKind::OpenAi,
                format!("{}/v1/chat/completions", server.uri()),
                "gpt-test",
            )
            .api_key("sk-test"),
        ))
        .build()
        .unwrap();

    let result = gateway
        .extract("Rust developer with Tokio", &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(result.high, vec!["Rust"]);
    assert_eq!(result.medium, vec!["Tokio"]);
    assert_eq!(result.low, vec!["Nix"]);
    assert_eq!(result.provider.as_deref(), Some("openai"));
    assert!(!result.degraded);
}

#[tokio::test]
async fn anthropic_dialect_answers_with_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "{\"answer\": \"Four years\", \"confidence\": 0.9}" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Switchyard::builder()
        .provider(fast(
            ProviderDescriptor::new(
                "anthropic",
                ProviderKind::Anthropic,
                format!("{}/v1/messages", server.uri()),
                "claude-test",
            )
            .api_key("ak-test"),
        ))
        .build()
        .unwrap();

    let answer = gateway
        .answer(
            "How much Rust experience?",
            "Four years of Rust at a fintech.",
            &RequestOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(answer.answer, "Four years");
    assert!((answer.confidence - 0.9).abs() < f32::EPSILON);
    assert_eq!(answer.provider.as_deref(), Some("anthropic"));
}

#[tokio::test]
async fn keyless_ollama_generates_without_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "stream": false, "model": "llama" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "Dear hiring team," },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Switchyard::builder()
        .provider(fast(
            ProviderDescriptor::new(
                "ollama",
                ProviderKind::Ollama,
                format!("{}/api/chat", server.uri()),
                "llama",
            )
            .capabilities(Capabilities {
                requires_key: false,
                ..Capabilities::default()
            }),
        ))
        .build()
        .unwrap();

    let text = gateway
        .generate_text(
            "cover_letter",
            &json!({ "role": "Backend engineer" }),
            &RequestOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(text.text, "Dear hiring team,");
    assert_eq!(text.operation, "cover_letter");
}

#[tokio::test]
async fn huggingface_dialect_reads_generated_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/mistral"))
        .and(header("authorization", "Bearer hf-test"))
        .and(body_partial_json(json!({ "parameters": { "return_full_text": false } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "Summary." }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Switchyard::builder()
        .provider(fast(
            ProviderDescriptor::new(
                "huggingface",
                ProviderKind::HuggingFace,
                format!("{}/models/mistral", server.uri()),
                "mistral",
            )
            .api_key("hf-test"),
        ))
        .build()
        .unwrap();

    let text = gateway
        .generate_text("summary", &json!({}), &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(text.text, "Summary.");
}

// ============================================================================
// Retry and fallback over HTTP
// ============================================================================

#[tokio::test]
async fn server_errors_are_retried_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "{\"answer\": \"yes\"}" } }]
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let gateway = Switchyard::builder()
        .provider(
            fast(ProviderDescriptor::new(
                "openai",
                ProviderKind::OpenAi,
                format!("{}/v1/chat/completions", server.uri()),
                "gpt-test",
            ))
            .api_key("sk-test")
            .retry_budget(3),
        )
        .build()
        .unwrap();

    let answer = gateway
        .answer("Remote?", "Fully remote role.", &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(answer.answer, "yes");

    let stats = gateway.provider_stats("openai").unwrap();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.successes, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn failing_primary_falls_back_to_secondary_server() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&primary)
        .await;

    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "[\"Go\", \"Kafka\", \"Redis\"]" } }]
        })))
        .expect(1)
        .mount(&secondary)
        .await;

    let descriptor = |id: &str, uri: String, priority| {
        fast(ProviderDescriptor::new(id, ProviderKind::OpenAi, uri, "m"))
            .api_key("k")
            .priority(priority)
    };
    let gateway = Switchyard::builder()
        .providers([
            descriptor("primary", primary.uri(), 0),
            descriptor("secondary", secondary.uri(), 1),
        ])
        .build()
        .unwrap();

    let result = gateway
        .extract("Go backend with Kafka", &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(result.provider.as_deref(), Some("secondary"));
    assert_eq!(result.all, vec!["Go", "Kafka", "Redis"]);
}
