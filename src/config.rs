//! Configuration loading.
//!
//! Configuration is read from a TOML file with the following resolution
//! order:
//! 1. Explicit path (CLI flag or builder argument)
//! 2. `$SWITCHYARD_CONFIG`
//! 3. `<config_dir>/switchyard/config.toml` (e.g. `~/.config/switchyard/config.toml`)
//! 4. Built-in defaults (the well-known hosted and local providers)
//!
//! API keys are never stored in the file. Each provider names the
//! environment variable holding its key (`api_key_env`); built-in providers
//! use the conventional variable for their vendor.
//!
//! ```toml
//! [gateway]
//! active_provider = "ollama"
//! debounce_ms = 250
//!
//! [cache.content]
//! max_entries = 200
//! ttl_secs = 3600
//!
//! [[providers]]
//! id = "ollama"
//! kind = "ollama"
//! endpoint = "http://localhost:11434/api/chat"
//! model = "llama3.2"
//! retries = 1
//! capabilities = { requires_key = false }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, CachesConfig, DEFAULT_FINGERPRINT_PREFIX};
use crate::debounce::DEFAULT_DEBOUNCE_DELAY;
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::providers::{Capabilities, GenerationParams, ProviderDescriptor, ProviderKind};
use crate::{Result, SwitchyardError};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "SWITCHYARD_CONFIG";

/// Built-in provider id → environment variable holding its key.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[
    ("openai", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("groq", "GROQ_API_KEY"),
    ("huggingface", "HF_API_KEY"),
];

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub cache: CacheSection,
    /// Provider table. Empty means the built-in providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// `[gateway]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySection {
    /// Provider tried first when a request names none. Default: highest priority.
    #[serde(default)]
    pub active_provider: Option<String>,
    /// Debounce window for `extract_debounced` (default: 300).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Leading characters hashed into a content fingerprint (default: 100).
    #[serde(default = "default_fingerprint_prefix")]
    pub fingerprint_prefix: usize,
    /// Buffer size of the event channel (default: 64).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            active_provider: None,
            debounce_ms: default_debounce_ms(),
            fingerprint_prefix: default_fingerprint_prefix(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_DELAY.as_millis() as u64
}

fn default_fingerprint_prefix() -> usize {
    DEFAULT_FINGERPRINT_PREFIX
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

/// `[cache.*]` sections. Unset fields keep the namespace's own default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub source: NamespaceSection,
    #[serde(default)]
    pub content: NamespaceSection,
    #[serde(default)]
    pub profile: NamespaceSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSection {
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl NamespaceSection {
    fn apply(&self, mut base: CacheConfig) -> CacheConfig {
        if let Some(n) = self.max_entries {
            base = base.max_entries(n);
        }
        if let Some(secs) = self.ttl_secs {
            base = base.ttl(Duration::from_secs(secs));
        }
        base
    }
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: ProviderKind,
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub params: GenerationParams,
    /// Per-attempt deadline in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Attempts including the first.
    #[serde(default)]
    pub retries: Option<u32>,
    /// Base backoff in milliseconds.
    #[serde(default)]
    pub backoff_ms: Option<u64>,
    /// Defaults to the entry's position in the file.
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    fn to_descriptor(&self, position: u32, lookup: &dyn Fn(&str) -> Option<String>) -> ProviderDescriptor {
        let mut descriptor =
            ProviderDescriptor::new(&self.id, self.kind, &self.endpoint, &self.model)
                .params(self.params.clone())
                .priority(self.priority.unwrap_or(position))
                .capabilities(self.capabilities);
        if let Some(name) = &self.name {
            descriptor = descriptor.name(name);
        }
        if let Some(secs) = self.timeout_secs {
            descriptor = descriptor.timeout(Duration::from_secs(secs));
        }
        if let Some(attempts) = self.retries {
            descriptor = descriptor.retry_budget(attempts);
        }
        if let Some(ms) = self.backoff_ms {
            descriptor = descriptor.base_delay(Duration::from_millis(ms));
        }
        let key = self
            .api_key_env
            .as_deref()
            .or_else(|| builtin_env_var(&self.id))
            .and_then(lookup);
        if let Some(key) = key {
            descriptor = descriptor.api_key(key);
        }
        descriptor
    }
}

impl GatewayConfig {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path that does not exist is an error; otherwise a missing
    /// file falls back to built-in defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SwitchyardError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SwitchyardError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            SwitchyardError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(SwitchyardError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) {
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(SwitchyardError::Configuration(format!(
                "Config file from ${CONFIG_ENV_VAR} not found: {path:?}"
            )));
        }

        Ok(Self::default_path().filter(|p| p.exists()))
    }

    /// `<config_dir>/switchyard/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("switchyard").join("config.toml"))
    }

    /// Provider descriptors with keys read from the process environment.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.descriptors_with(&|var| {
            std::env::var(var).ok().filter(|v| !v.trim().is_empty())
        })
    }

    /// Provider descriptors with keys resolved through `lookup`.
    pub fn descriptors_with(&self, lookup: &dyn Fn(&str) -> Option<String>) -> Vec<ProviderDescriptor> {
        if self.providers.is_empty() {
            return ProviderDescriptor::builtin()
                .into_iter()
                .map(|d| match builtin_env_var(&d.id).and_then(lookup) {
                    Some(key) => d.api_key(key),
                    None => d,
                })
                .collect();
        }
        self.providers
            .iter()
            .zip(0u32..)
            .map(|(p, position)| p.to_descriptor(position, lookup))
            .collect()
    }

    /// Cache settings with file overrides applied.
    pub fn caches(&self) -> CachesConfig {
        let defaults = CachesConfig::default();
        CachesConfig {
            source: self.cache.source.apply(defaults.source),
            content: self.cache.content.apply(defaults.content),
            profile: self.cache.profile.apply(defaults.profile),
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.gateway.debounce_ms)
    }
}

fn builtin_env_var(id: &str) -> Option<&'static str> {
    PROVIDER_ENV_VARS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, var)| *var)
}
