//! Per-provider call statistics.
//!
//! The executor records one [`AttemptOutcome`] per attempt. Average latency
//! is a running mean over successful attempts only, updated in place; no
//! per-call history is kept. Counters live for the lifetime of the owning
//! gateway and reset only on [`StatsCollector::clear`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// Result of one provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
    /// A failure caused by the per-attempt deadline.
    Timeout,
}

/// Counters for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub successes: u64,
    /// All failed attempts, timeouts included.
    pub failures: u64,
    /// Failed attempts that hit the deadline.
    pub timeouts: u64,
    /// Running mean over successful attempts.
    #[serde(with = "duration_ms")]
    pub average_latency: Duration,
}

impl ProviderStats {
    fn record(&mut self, outcome: AttemptOutcome, latency: Duration) {
        self.calls += 1;
        match outcome {
            AttemptOutcome::Success => {
                self.successes += 1;
                let mean = self.average_latency.as_secs_f64();
                let sample = latency.as_secs_f64();
                let updated = mean + (sample - mean) / self.successes as f64;
                self.average_latency = Duration::from_secs_f64(updated.max(0.0));
            }
            AttemptOutcome::Failure => self.failures += 1,
            AttemptOutcome::Timeout => {
                self.failures += 1;
                self.timeouts += 1;
            }
        }
    }
}

/// Thread-safe table of [`ProviderStats`] keyed by provider id.
#[derive(Debug, Default)]
pub struct StatsCollector {
    table: Mutex<HashMap<String, ProviderStats>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt against `provider`.
    pub fn record(&self, provider: &str, outcome: AttemptOutcome, latency: Duration) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(provider.to_string())
            .or_default()
            .record(outcome, latency);
    }

    /// Stats for one provider, if it has been called.
    pub fn get(&self, provider: &str) -> Option<ProviderStats> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    /// Copy of every provider's counters, ordered by provider id.
    pub fn snapshot(&self) -> BTreeMap<String, ProviderStats> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Reset all counters.
    pub fn clear(&self) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }
}
