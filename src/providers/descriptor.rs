//! Static provider descriptors.
//!
//! A [`ProviderDescriptor`] says everything the executor needs to call one
//! backend: where it lives, which dialect it speaks, which model and
//! generation parameters to send, and how long/how often to try. Descriptors
//! are built once at startup and never mutated.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Request/response dialect spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat-completions, also spoken by OpenAI-compatible hosts.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Ollama chat API.
    Ollama,
    /// HuggingFace text-generation inference.
    HuggingFace,
}

/// Gateway operation a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Extract,
    Generate,
    Answer,
}

/// Capability flags declared by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub extract: bool,
    pub generate: bool,
    pub answer: bool,
    /// Calls fail without an API key; keyless providers are skipped.
    pub requires_key: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            extract: true,
            generate: true,
            answer: true,
            requires_key: true,
        }
    }
}

impl Capabilities {
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Extract => self.extract,
            Capability::Generate => self.generate,
            Capability::Answer => self.answer,
        }
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// Immutable description of one backend.
#[derive(Clone, PartialEq)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    /// Full URL of the completion endpoint.
    pub endpoint: String,
    pub model: String,
    pub params: GenerationParams,
    /// Hard deadline for a single attempt.
    pub timeout: Duration,
    /// Maximum number of attempts, including the first. Always at least 1.
    pub retry_budget: u32,
    /// Backoff before retry `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
    /// Lower ranks are tried first.
    pub priority: u32,
    pub capabilities: Capabilities,
    pub api_key: Option<String>,
}

impl ProviderDescriptor {
    /// Descriptor with default timing (30s timeout, 3 attempts, 500ms base delay).
    pub fn new(
        id: impl Into<String>,
        kind: ProviderKind,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            endpoint: endpoint.into(),
            model: model.into(),
            params: GenerationParams::default(),
            timeout: Duration::from_secs(30),
            retry_budget: 3,
            base_delay: Duration::from_millis(500),
            priority: 0,
            capabilities: Capabilities::default(),
            api_key: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the attempt budget. Zero is treated as one.
    pub fn retry_budget(mut self, attempts: u32) -> Self {
        self.retry_budget = attempts.max(1);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn priority(mut self, rank: u32) -> Self {
        self.priority = rank;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Whether this provider can be called for `capability` right now.
    ///
    /// False when the capability is not declared, or when the provider needs
    /// a key and has none.
    pub fn can_serve(&self, capability: Capability) -> bool {
        self.capabilities.supports(capability)
            && (!self.capabilities.requires_key || self.api_key.is_some())
    }

    /// Backoff to wait after failed attempt `attempt` (0-indexed).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Descriptors for the well-known hosted and local backends.
    ///
    /// None carry keys; the config layer fills them in from the environment.
    pub fn builtin() -> Vec<ProviderDescriptor> {
        let keyless = Capabilities {
            requires_key: false,
            ..Capabilities::default()
        };
        vec![
            ProviderDescriptor::new(
                "openai",
                ProviderKind::OpenAi,
                "https://api.openai.com/v1/chat/completions",
                "gpt-4o-mini",
            )
            .name("OpenAI")
            .priority(0),
            ProviderDescriptor::new(
                "anthropic",
                ProviderKind::Anthropic,
                "https://api.anthropic.com/v1/messages",
                "claude-3-5-haiku-latest",
            )
            .name("Anthropic")
            .priority(1),
            ProviderDescriptor::new(
                "groq",
                ProviderKind::OpenAi,
                "https://api.groq.com/openai/v1/chat/completions",
                "llama-3.1-8b-instant",
            )
            .name("Groq")
            .timeout(Duration::from_secs(20))
            .priority(2),
            ProviderDescriptor::new(
                "huggingface",
                ProviderKind::HuggingFace,
                "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.3",
                "mistralai/Mistral-7B-Instruct-v0.3",
            )
            .name("HuggingFace")
            .timeout(Duration::from_secs(60))
            .retry_budget(2)
            .base_delay(Duration::from_secs(1))
            .priority(3),
            ProviderDescriptor::new(
                "ollama",
                ProviderKind::Ollama,
                "http://localhost:11434/api/chat",
                "llama3.2",
            )
            .name("Ollama (local)")
            .timeout(Duration::from_secs(120))
            .retry_budget(1)
            .priority(4)
            .capabilities(keyless),
        ]
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("retry_budget", &self.retry_budget)
            .field("base_delay", &self.base_delay)
            .field("priority", &self.priority)
            .field("capabilities", &self.capabilities)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let d = ProviderDescriptor::new("p", ProviderKind::OpenAi, "http://x", "m")
            .base_delay(Duration::from_millis(100));
        assert_eq!(d.backoff_for_attempt(0), Duration::from_millis(100));
        assert_eq!(d.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(d.backoff_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn zero_retry_budget_means_one_attempt() {
        let d = ProviderDescriptor::new("p", ProviderKind::OpenAi, "http://x", "m").retry_budget(0);
        assert_eq!(d.retry_budget, 1);
    }

    #[test]
    fn keyed_provider_without_key_cannot_serve() {
        let d = ProviderDescriptor::new("p", ProviderKind::OpenAi, "http://x", "m");
        assert!(!d.can_serve(Capability::Extract));
        assert!(d.api_key("sk").can_serve(Capability::Extract));
    }

    #[test]
    fn debug_redacts_api_key() {
        let d = ProviderDescriptor::new("p", ProviderKind::OpenAi, "http://x", "m")
            .api_key("sk-secret");
        let rendered = format!("{d:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn builtin_ids_are_unique_and_ranked() {
        let builtin = ProviderDescriptor::builtin();
        let ids: std::collections::HashSet<_> = builtin.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), builtin.len());
        assert!(builtin.windows(2).all(|w| w[0].priority < w[1].priority));
    }
}
