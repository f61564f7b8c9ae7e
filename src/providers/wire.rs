//! Request encoding and completion decoding per [`ProviderKind`].
//!
//! Each dialect gets a fully-formed [`HttpRequest`] built from the
//! descriptor and a [`Prompt`], and a decoder that pulls the completion text
//! out of a successful response body. Anything richer than text (keyword
//! tiers, answer confidence) is left to the normalizer.

use serde_json::{Value, json};

use super::descriptor::{ProviderDescriptor, ProviderKind};
use super::traits::HttpRequest;
use crate::{Result, SwitchyardError};

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic requires `max_tokens`; used when the descriptor leaves it unset.
const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;

/// System + user prompt pair rendered for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Build the request `descriptor` expects for `prompt`.
pub fn build_request(descriptor: &ProviderDescriptor, prompt: &Prompt) -> HttpRequest {
    let params = &descriptor.params;
    match descriptor.kind {
        ProviderKind::OpenAi => {
            let mut body = json!({
                "model": descriptor.model,
                "messages": chat_messages(prompt),
            });
            insert_opt(&mut body, "temperature", params.temperature.map(Value::from));
            insert_opt(&mut body, "max_tokens", params.max_tokens.map(Value::from));
            insert_opt(&mut body, "top_p", params.top_p.map(Value::from));
            bearer(HttpRequest::post(&descriptor.endpoint, body), descriptor)
        }
        ProviderKind::Anthropic => {
            let mut body = json!({
                "model": descriptor.model,
                "system": prompt.system,
                "messages": [{ "role": "user", "content": prompt.user }],
                "max_tokens": params.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
            });
            insert_opt(&mut body, "temperature", params.temperature.map(Value::from));
            insert_opt(&mut body, "top_p", params.top_p.map(Value::from));
            let mut request = HttpRequest::post(&descriptor.endpoint, body)
                .header("anthropic-version", ANTHROPIC_VERSION);
            if let Some(key) = &descriptor.api_key {
                request = request.header("x-api-key", key.as_str());
            }
            request
        }
        ProviderKind::Ollama => {
            let mut options = json!({});
            insert_opt(&mut options, "temperature", params.temperature.map(Value::from));
            insert_opt(&mut options, "num_predict", params.max_tokens.map(Value::from));
            insert_opt(&mut options, "top_p", params.top_p.map(Value::from));
            let body = json!({
                "model": descriptor.model,
                "messages": chat_messages(prompt),
                "stream": false,
                "options": options,
            });
            bearer(HttpRequest::post(&descriptor.endpoint, body), descriptor)
        }
        ProviderKind::HuggingFace => {
            let mut parameters = json!({ "return_full_text": false });
            insert_opt(&mut parameters, "temperature", params.temperature.map(Value::from));
            insert_opt(&mut parameters, "max_new_tokens", params.max_tokens.map(Value::from));
            insert_opt(&mut parameters, "top_p", params.top_p.map(Value::from));
            let body = json!({
                "inputs": format!("{}\n\n{}", prompt.system, prompt.user),
                "parameters": parameters,
            });
            bearer(HttpRequest::post(&descriptor.endpoint, body), descriptor)
        }
    }
}

/// Pull the completion text out of a successful response body.
///
/// Returns `EmptyResponse` when the body parses but holds no (non-blank)
/// completion, and `Json` when it is not JSON at all.
pub fn extract_text(kind: ProviderKind, body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)?;
    let text = match kind {
        ProviderKind::OpenAi => value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string),
        ProviderKind::Anthropic => value.get("content").and_then(Value::as_array).map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        }),
        ProviderKind::Ollama => value
            .pointer("/message/content")
            .or_else(|| value.get("response"))
            .and_then(Value::as_str)
            .map(str::to_string),
        ProviderKind::HuggingFace => value
            .pointer("/0/generated_text")
            .or_else(|| value.get("generated_text"))
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(SwitchyardError::EmptyResponse),
    }
}

fn chat_messages(prompt: &Prompt) -> Value {
    json!([
        { "role": "system", "content": prompt.system },
        { "role": "user", "content": prompt.user },
    ])
}

fn bearer(request: HttpRequest, descriptor: &ProviderDescriptor) -> HttpRequest {
    match &descriptor.api_key {
        Some(key) => request.header("authorization", format!("Bearer {key}")),
        None => request,
    }
}

fn insert_opt(target: &mut Value, key: &str, value: Option<Value>) {
    if let (Some(map), Some(value)) = (target.as_object_mut(), value) {
        map.insert(key.to_string(), value);
    }
}
