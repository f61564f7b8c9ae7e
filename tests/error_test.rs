use std::time::Duration;

use switchyard::{Result, SwitchyardError};

#[test]
fn test_error_display() {
    let err = SwitchyardError::ProviderNotFound("mystery".to_string());
    assert!(err.to_string().contains("mystery"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(SwitchyardError::NoProvider)
    }
    assert!(returns_error().is_err());
}

#[test]
fn timeout_names_provider_and_deadline() {
    let err = SwitchyardError::Timeout {
        provider: "groq".into(),
        timeout: Duration::from_secs(20),
    };
    let text = err.to_string();
    assert!(text.contains("groq"));
    assert!(text.contains("20s"));
    assert!(err.is_timeout());
    assert!(!err.is_exhaustion());
}

#[test]
fn provider_exhaustion_carries_last_cause() {
    let err = SwitchyardError::ProviderExhausted {
        provider: "openai".into(),
        attempts: 3,
        last_cause: Box::new(SwitchyardError::Http {
            status: 429,
            body: "slow down".into(),
        }),
    };
    let text = err.to_string();
    assert!(text.contains("openai"));
    assert!(text.contains("3 attempt"));
    assert!(text.contains("429"));
    assert!(err.is_exhaustion());
    assert_eq!(err.kind(), "provider_exhausted");
}

#[test]
fn all_providers_exhausted_lists_attempts_in_order() {
    let err = SwitchyardError::AllProvidersExhausted {
        attempted: vec!["a".into(), "b".into(), "c".into()],
        last_cause: None,
    };
    assert!(err.to_string().contains("a, b, c"));
    assert!(err.is_exhaustion());
}

#[test]
fn superseded_is_distinct_from_cancelled() {
    assert!(SwitchyardError::Superseded.is_superseded());
    assert!(!SwitchyardError::Cancelled.is_superseded());
    assert_eq!(SwitchyardError::Cancelled.kind(), "cancelled");
}

#[test]
fn json_errors_convert() {
    let err: SwitchyardError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, SwitchyardError::Json(_)));
    assert_eq!(err.kind(), "json");
}
