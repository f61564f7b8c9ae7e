//! Caching subsystem.
//!
//! Three independent [`CacheNamespace`]s, each with its own TTL and capacity:
//!
//! - `source`: short-lived results keyed on a caller-supplied source
//!   identifier (e.g. the URL a document was read from).
//!
//! - `content`: longer-lived results keyed on a [`fingerprint`] of the
//!   input content.
//!
//! - `profile`: a single-slot cache holding the profile for the current
//!   subject. Setting a profile for another subject replaces it.
//!
//! All namespaces evict in pure insertion order and expire lazily on read.
//! See [`namespace`] for the exact semantics.

pub mod namespace;

pub use namespace::{CacheConfig, CacheNamespace};

use std::time::Duration;

use crate::types::CanonicalResult;

/// Number of leading characters that feed a content fingerprint.
pub const DEFAULT_FINGERPRINT_PREFIX: usize = 100;

/// Derive a cheap content key from a fixed-size prefix plus the total length.
///
/// Two inputs with the same byte length and the same leading
/// `prefix_chars` characters share a key.
pub fn fingerprint(content: &str, prefix_chars: usize) -> String {
    let prefix: String = content.chars().take(prefix_chars).collect();
    format!("{}:{prefix}", content.len())
}

/// Capacity/TTL settings for all three namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachesConfig {
    pub source: CacheConfig,
    pub content: CacheConfig,
    pub profile: CacheConfig,
}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            source: CacheConfig::new()
                .max_entries(50)
                .ttl(Duration::from_secs(5 * 60)),
            content: CacheConfig::new()
                .max_entries(100)
                .ttl(Duration::from_secs(30 * 60)),
            profile: CacheConfig::new()
                .max_entries(1)
                .ttl(Duration::from_secs(10 * 60)),
        }
    }
}

/// The gateway's cache namespaces, owned by one gateway instance.
#[derive(Debug)]
pub struct GatewayCaches {
    pub source: CacheNamespace<CanonicalResult>,
    pub content: CacheNamespace<CanonicalResult>,
    pub profile: CacheNamespace<serde_json::Value>,
}

impl GatewayCaches {
    /// Create empty namespaces with the given settings.
    pub fn new(config: &CachesConfig) -> Self {
        Self {
            source: CacheNamespace::new("source", config.source.clone()),
            content: CacheNamespace::new("content", config.content.clone()),
            profile: CacheNamespace::new("profile", config.profile.clone()),
        }
    }

    /// Evict everything from every namespace.
    pub fn clear_all(&self) {
        self.source.clear();
        self.content.clear();
        self.profile.clear();
    }
}

impl Default for GatewayCaches {
    fn default() -> Self {
        Self::new(&CachesConfig::default())
    }
}
