//! Caller options for gateway operations

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Per-call options recognised by every gateway operation.
///
/// ```rust
/// # use switchyard::RequestOptions;
/// let options = RequestOptions::default()
///     .provider("anthropic")
///     .max_items(20)
///     .skip_cache(true);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Provider to try first, ahead of the active provider and priority order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Bypass cache reads. Results are still written back.
    #[serde(default)]
    pub skip_cache: bool,
    /// Fall through to the next provider when one is exhausted. Default: true.
    #[serde(default = "default_allow_fallback")]
    pub allow_fallback: bool,
    /// Cap on the number of items in the returned result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Identifier of where the input came from (e.g. a page URL). Enables
    /// the short-lived per-source cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Caller-owned cancellation. Defaults to a child of the gateway's
    /// shutdown token.
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

fn default_allow_fallback() -> bool {
    true
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            provider: None,
            skip_cache: false,
            allow_fallback: default_allow_fallback(),
            max_items: None,
            source_id: None,
            cancel: None,
        }
    }
}

impl RequestOptions {
    pub fn provider(mut self, id: impl Into<String>) -> Self {
        self.provider = Some(id.into());
        self
    }

    pub fn skip_cache(mut self, skip: bool) -> Self {
        self.skip_cache = skip;
        self
    }

    pub fn allow_fallback(mut self, allow: bool) -> Self {
        self.allow_fallback = allow;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_enabled_by_default() {
        assert!(RequestOptions::default().allow_fallback);
        let parsed: RequestOptions = serde_json::from_str("{}").unwrap();
        assert!(parsed.allow_fallback);
        assert!(!parsed.skip_cache);
    }

    #[test]
    fn builder_sets_fields() {
        let options = RequestOptions::default()
            .provider("ollama")
            .allow_fallback(false)
            .max_items(5)
            .source_id("https://jobs.example/42");
        assert_eq!(options.provider.as_deref(), Some("ollama"));
        assert!(!options.allow_fallback);
        assert_eq!(options.max_items, Some(5));
        assert_eq!(options.source_id.as_deref(), Some("https://jobs.example/42"));
    }
}
