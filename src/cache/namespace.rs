//! Bounded FIFO cache namespace with lazy TTL expiry.
//!
//! Each [`CacheNamespace`] holds at most `max_entries` values. When full,
//! inserting a new key evicts the single oldest *inserted* entry; reads never
//! change eviction order. Entries older than the namespace TTL read as a miss
//! but stay stored until evicted, overwritten or cleared. There is no
//! background sweep.
//!
//! Time is measured with [`tokio::time::Instant`], so tests can drive expiry
//! with a paused clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;

/// Capacity and lifetime for one cache namespace.
///
/// ```rust
/// # use switchyard::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(50)
///     .ttl(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of stored entries. Default: 100.
    pub max_entries: usize,
    /// Age after which an entry reads as a miss. Default: 30 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of stored entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted: Instant,
}

#[derive(Debug)]
struct Slots<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

/// A named, bounded, insertion-ordered cache with lazy TTL expiry.
///
/// Safe to share between tasks; every operation holds the internal lock for
/// its whole duration, so no caller observes a half-applied insert or evict.
#[derive(Debug)]
pub struct CacheNamespace<V> {
    name: &'static str,
    config: CacheConfig,
    slots: Mutex<Slots<V>>,
}

impl<V: Clone> CacheNamespace<V> {
    /// Create an empty namespace.
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            name,
            slots: Mutex::new(Slots {
                entries: HashMap::with_capacity(config.max_entries),
                order: VecDeque::with_capacity(config.max_entries),
            }),
            config,
        }
    }

    /// Namespace name, used as the metrics label.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Configuration this namespace was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a live entry.
    ///
    /// Returns `None` when the key is absent or its entry has outlived the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let slots = self.lock();
        let hit = slots
            .entries
            .get(key)
            .filter(|entry| entry.inserted.elapsed() < self.config.ttl)
            .map(|entry| entry.value.clone());

        if hit.is_some() {
            debug!(namespace = self.name, key, "cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "namespace" => self.name).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "namespace" => self.name)
                .increment(1);
        }
        hit
    }

    /// Insert (or overwrite) an entry.
    ///
    /// Overwriting counts as a fresh insertion: the entry's timestamp resets
    /// and it moves to the back of the eviction queue. A new key inserted at
    /// capacity first evicts the oldest-inserted entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        if self.config.max_entries == 0 {
            return;
        }
        let key = key.into();
        let mut slots = self.lock();

        if slots.entries.contains_key(&key) {
            slots.order.retain(|k| k != &key);
        } else {
            while slots.entries.len() >= self.config.max_entries {
                let Some(oldest) = slots.order.pop_front() else {
                    break;
                };
                slots.entries.remove(&oldest);
                debug!(namespace = self.name, key = %oldest, "cache evicted oldest entry");
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "namespace" => self.name)
                    .increment(1);
            }
        }

        slots.order.push_back(key.clone());
        slots.entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    /// Whether a key is physically stored, live or expired.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Number of physically stored entries, including expired ones.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the namespace stores nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut slots = self.lock();
        slots.entries.clear();
        slots.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Slots<V>> {
        // Every critical section leaves `Slots` consistent, so a poisoned
        // lock still guards valid data.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
