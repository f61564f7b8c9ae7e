//! Switchyard error types

use std::time::Duration;

/// Switchyard error types
#[derive(Debug, thiserror::Error)]
pub enum SwitchyardError {
    // Single-attempt failures
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider '{provider}' timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("empty response from provider")]
    EmptyResponse,

    // Exhaustion
    /// One provider used up its retry budget. Carries the last attempt's cause.
    #[error("provider '{provider}' exhausted after {attempts} attempt(s): {last_cause}")]
    ProviderExhausted {
        provider: String,
        attempts: u32,
        last_cause: Box<SwitchyardError>,
    },

    /// Every provider in the fallback pass was exhausted.
    #[error("all providers exhausted (tried: {})", attempted.join(", "))]
    AllProvidersExhausted {
        attempted: Vec<String>,
        last_cause: Option<Box<SwitchyardError>>,
    },

    // Coordination
    /// A newer debounced call for the same key replaced this one.
    #[error("superseded by a newer request")]
    Superseded,

    /// The request was cancelled before or between attempts.
    #[error("request cancelled")]
    Cancelled,

    // Configuration errors
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("no usable provider configured")]
    NoProvider,

    #[error("configuration error: {0}")]
    Configuration(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(String),
}

impl SwitchyardError {
    /// Whether this error is an attempt that exceeded its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SwitchyardError::Timeout { .. })
    }

    /// Whether this error means a provider (or every provider) gave up.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            SwitchyardError::ProviderExhausted { .. } | SwitchyardError::AllProvidersExhausted { .. }
        )
    }

    /// Whether this error is a debounce supersession.
    pub fn is_superseded(&self) -> bool {
        matches!(self, SwitchyardError::Superseded)
    }

    /// Short label for the error kind, used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            SwitchyardError::Transport(_) => "transport",
            SwitchyardError::Timeout { .. } => "timeout",
            SwitchyardError::Http { .. } => "http",
            SwitchyardError::EmptyResponse => "empty_response",
            SwitchyardError::ProviderExhausted { .. } => "provider_exhausted",
            SwitchyardError::AllProvidersExhausted { .. } => "all_providers_exhausted",
            SwitchyardError::Superseded => "superseded",
            SwitchyardError::Cancelled => "cancelled",
            SwitchyardError::ProviderNotFound(_) => "provider_not_found",
            SwitchyardError::NoProvider => "no_provider",
            SwitchyardError::Configuration(_) => "configuration",
            SwitchyardError::Json(_) => "json",
            SwitchyardError::InvalidInput(_) => "invalid_input",
            SwitchyardError::Store(_) => "store",
        }
    }
}

impl From<reqwest::Error> for SwitchyardError {
    fn from(err: reqwest::Error) -> Self {
        SwitchyardError::Transport(err.to_string())
    }
}

/// Result type alias for Switchyard operations
pub type Result<T> = std::result::Result<T, SwitchyardError>;
