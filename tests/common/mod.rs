//! Shared mock transport for integration tests.
//!
//! Routes on the request URL: each provider gets its own endpoint
//! (`http://<id>.test`) and a scripted behaviour.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use switchyard::providers::{HttpRequest, HttpResponse, ProviderDescriptor, ProviderKind, Transport};
use switchyard::{Result, SwitchyardError};

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer 200 with this completion text (OpenAI dialect).
    Reply(String),
    /// Answer with this non-success status.
    Status(u16),
    /// Fail at the transport layer.
    Refuse,
    /// Never answer.
    Hang,
}

#[derive(Default)]
pub struct ScriptedTransport {
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, provider: &str, behavior: Behavior) -> Self {
        self.set(provider, behavior);
        self
    }

    pub fn set(&self, provider: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(endpoint(provider), behavior);
    }

    /// Network calls received by `provider`.
    pub fn calls(&self, provider: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&endpoint(provider))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_default() += 1;
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or(Behavior::Status(404));
        match behavior {
            Behavior::Reply(content) => Ok(HttpResponse::new(
                200,
                json!({ "choices": [{ "message": { "content": content } }] }).to_string(),
            )),
            Behavior::Status(status) => Ok(HttpResponse::new(status, "scripted failure")),
            Behavior::Refuse => Err(SwitchyardError::Transport("connection refused".into())),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

pub fn endpoint(provider: &str) -> String {
    format!("http://{provider}.test/v1/chat/completions")
}

/// OpenAI-dialect provider with a one-attempt budget and short delays.
pub fn provider(id: &str, priority: u32) -> ProviderDescriptor {
    ProviderDescriptor::new(id, ProviderKind::OpenAi, endpoint(id), "test-model")
        .api_key("test-key")
        .retry_budget(1)
        .base_delay(Duration::from_millis(10))
        .timeout(Duration::from_secs(5))
        .priority(priority)
}

pub const TIERED_REPLY: &str =
    r#"{"required": ["Rust", "Tokio"], "preferred": ["gRPC"], "nice_to_have": ["Nix"]}"#;

pub const POSTING: &str = "We are hiring a backend engineer. \
    Requirements: 5+ years of experience with Rust and PostgreSQL. \
    Bachelor's degree in Computer Science required. \
    Experience with Kubernetes preferred. \
    Nice to have: GraphQL, Vue.js and an event-driven mindset.";
