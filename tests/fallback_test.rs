//! Fallback ordering across providers and degradation to the offline
//! extractor.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{Behavior, POSTING, ScriptedTransport, TIERED_REPLY, provider};
use switchyard::events::GatewayEvent;
use switchyard::{Gateway, RequestGateway, RequestOptions, Switchyard, SwitchyardError};

fn gateway(transport: Arc<ScriptedTransport>) -> Gateway {
    Switchyard::builder()
        .providers([provider("a", 0), provider("b", 1), provider("c", 2)])
        .transport(transport)
        .build()
        .unwrap()
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn first_two_fail_third_wins() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with("a", Behavior::Status(500))
            .with("b", Behavior::Refuse)
            .with("c", Behavior::Reply(TIERED_REPLY.into())),
    );
    let gateway = gateway(transport.clone());

    let result = gateway
        .extract("some posting", &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(result.provider.as_deref(), Some("c"));
    assert!(!result.degraded);
    assert_eq!(result.high, vec!["Rust", "Tokio"]);

    let stats = gateway.stats();
    assert_eq!(stats["a"].failures, 1);
    assert_eq!(stats["a"].successes, 0);
    assert_eq!(stats["b"].failures, 1);
    assert_eq!(stats["c"].successes, 1);
    assert_eq!(stats["c"].failures, 0);
}

#[tokio::test]
async fn each_provider_is_tried_once_per_request() {
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = Switchyard::builder()
        .providers([
            provider("a", 0).retry_budget(2),
            provider("b", 1).retry_budget(3),
        ])
        .transport(transport.clone())
        .build()
        .unwrap();

    let err = gateway
        .answer("q?", "ctx", &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SwitchyardError::AllProvidersExhausted { .. }));
    // Budgets are spent exactly once; no provider is revisited.
    assert_eq!(transport.calls("a"), 2);
    assert_eq!(transport.calls("b"), 3);
}

#[tokio::test]
async fn override_goes_first_then_priority_order() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with("c", Behavior::Status(503))
            .with("a", Behavior::Reply(r#"{"answer": "from a"}"#.into())),
    );
    let gateway = gateway(transport.clone());

    let answer = gateway
        .answer("q?", "ctx", &RequestOptions::default().provider("c"))
        .await
        .unwrap();

    assert_eq!(answer.provider.as_deref(), Some("a"));
    assert_eq!(transport.calls("c"), 1);
    assert_eq!(transport.calls("b"), 0);
}

#[tokio::test]
async fn active_provider_is_tried_first() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with("a", Behavior::Reply(r#"{"answer": "a"}"#.into()))
            .with("b", Behavior::Reply(r#"{"answer": "b"}"#.into())),
    );
    let gateway = gateway(transport.clone());
    gateway.set_active_provider("b").await.unwrap();

    let answer = gateway
        .answer("q?", "ctx", &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(answer.answer, "b");
    assert_eq!(transport.calls("a"), 0);
}

#[tokio::test]
async fn disabling_fallback_tries_only_the_first_provider() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with("a", Behavior::Status(500))
            .with("b", Behavior::Reply("unused".into())),
    );
    let gateway = gateway(transport.clone());

    let err = gateway
        .generate_text(
            "summary",
            &json!({ "text": "x" }),
            &RequestOptions::default().allow_fallback(false),
        )
        .await
        .unwrap_err();

    match err {
        SwitchyardError::AllProvidersExhausted {
            attempted,
            last_cause,
        } => {
            assert_eq!(attempted, vec!["a".to_string()]);
            assert!(matches!(
                last_cause.as_deref(),
                Some(SwitchyardError::ProviderExhausted { attempts: 1, .. })
            ));
        }
        other => panic!("expected AllProvidersExhausted, got {other:?}"),
    }
    assert_eq!(transport.calls("b"), 0);
}

#[tokio::test]
async fn unknown_provider_override_is_an_error() {
    let gateway = gateway(Arc::new(ScriptedTransport::new()));
    let err = gateway
        .answer("q?", "ctx", &RequestOptions::default().provider("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::ProviderNotFound(_)));
}

#[tokio::test]
async fn providers_missing_capability_or_key_are_skipped() {
    let mut keyless = provider("a", 0);
    keyless.api_key = None;
    let mut no_answer = provider("b", 1);
    no_answer.capabilities.answer = false;

    let transport = Arc::new(
        ScriptedTransport::new().with("c", Behavior::Reply(r#"{"answer": "c"}"#.into())),
    );
    let gateway = Switchyard::builder()
        .providers([keyless, no_answer, provider("c", 2)])
        .transport(transport.clone())
        .build()
        .unwrap();

    let answer = gateway
        .answer("q?", "ctx", &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(answer.provider.as_deref(), Some("c"));
    assert_eq!(transport.calls("a") + transport.calls("b"), 0);
    assert!(gateway.provider_stats("a").is_none());
}

#[tokio::test]
async fn no_fallback_skips_an_active_provider_without_a_key() {
    let mut keyless = provider("a", 0);
    keyless.api_key = None;

    let transport = Arc::new(
        ScriptedTransport::new()
            .with("a", Behavior::Reply(r#"{"answer": "a"}"#.into()))
            .with("b", Behavior::Reply(r#"{"answer": "b"}"#.into())),
    );
    let gateway = Switchyard::builder()
        .providers([keyless, provider("b", 1), provider("c", 2)])
        .transport(transport.clone())
        .build()
        .unwrap();
    assert_eq!(gateway.active_provider(), "a");

    let answer = gateway
        .answer("q?", "ctx", &RequestOptions::default().allow_fallback(false))
        .await
        .unwrap();
    assert_eq!(answer.provider.as_deref(), Some("b"));
    assert_eq!(transport.calls("a"), 0);
    assert_eq!(transport.calls("c"), 0);
}

#[tokio::test]
async fn unusable_override_without_fallback_is_reported() {
    let mut keyless = provider("a", 0);
    keyless.api_key = None;

    let transport = Arc::new(ScriptedTransport::new());
    let gateway = Switchyard::builder()
        .providers([keyless, provider("b", 1)])
        .transport(transport.clone())
        .build()
        .unwrap();

    let err = gateway
        .generate_text(
            "summary",
            &serde_json::json!({}),
            &RequestOptions::default().provider("a").allow_fallback(false),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::Configuration(_)));
    assert_eq!(transport.total_calls(), 0);
}

// ============================================================================
// Degradation
// ============================================================================

#[tokio::test]
async fn total_failure_degrades_extraction() {
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = gateway(transport.clone());
    let mut events = gateway.subscribe();

    let result = gateway
        .extract(POSTING, &RequestOptions::default())
        .await
        .unwrap();

    assert!(result.degraded);
    assert!(result.provider.is_none());
    assert_eq!(result.total, result.all.len());
    assert_eq!(result.high, vec!["Rust", "PostgreSQL"]);
    assert_eq!(result.signals.min_years_experience, Some(5));
    assert_eq!(transport.total_calls(), 3);

    let mut failed = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            GatewayEvent::ProviderFailed { provider, .. } => failed.push(provider),
            GatewayEvent::Degraded { operation } => {
                assert_eq!(operation, "extract");
                break;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(failed, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn degraded_extraction_of_unrecognised_text_is_empty_not_an_error() {
    let gateway = gateway(Arc::new(ScriptedTransport::new()));
    let result = gateway
        .extract("lorem ipsum dolor sit amet", &RequestOptions::default())
        .await
        .unwrap();
    assert!(result.degraded);
    assert_eq!(result.total, 0);
    assert!(result.all.is_empty());
}

#[tokio::test]
async fn generation_and_answers_surface_exhaustion() {
    let gateway = gateway(Arc::new(ScriptedTransport::new()));

    let err = gateway
        .generate_text("cover_letter", &json!({}), &RequestOptions::default())
        .await
        .unwrap_err();
    match err {
        SwitchyardError::AllProvidersExhausted { attempted, .. } => {
            assert_eq!(attempted, vec!["a", "b", "c"]);
        }
        other => panic!("expected AllProvidersExhausted, got {other:?}"),
    }

    let err = gateway
        .answer("q?", "ctx", &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_exhaustion());
}
