//! Supersede-on-repeat request coalescing.
//!
//! [`Debouncer::schedule`] delays a thunk by `delay`. Scheduling again under
//! the same key before the delay elapses aborts the earlier timer (its thunk
//! never runs) and rejects the earlier caller with `Superseded`. At most one
//! timer per key exists at any instant.
//!
//! Each timer is a spawned task, so a scheduled thunk runs even if nobody
//! polls the returned future. Registration happens synchronously inside
//! `schedule`, before the returned future is first polled.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::telemetry;
use crate::{Result, SwitchyardError};

/// Default coalescing window.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug)]
struct Slot {
    generation: u64,
    timer: AbortHandle,
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

/// Per-key debounce table, owned by one gateway instance.
#[derive(Debug, Default)]
pub struct Debouncer {
    slots: Slots,
    next_generation: AtomicU64,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `thunk` after `delay` unless another call for `key` replaces it.
    ///
    /// Must be called from within a Tokio runtime. The returned future
    /// resolves to the thunk's result, or to `Superseded` if a later call
    /// for the same key arrived first.
    pub fn schedule<T, F, Fut>(
        &self,
        key: impl Into<String>,
        delay: Duration,
        thunk: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        // Hold the table while spawning so the timer cannot fire before its
        // slot is registered.
        let mut slots = lock(&self.slots);
        let table = Arc::clone(&self.slots);
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slots = lock(&table);
                match slots.get(&timer_key) {
                    Some(slot) if slot.generation == generation => {
                        slots.remove(&timer_key);
                    }
                    // Replaced between waking and taking the lock.
                    _ => return,
                }
            }
            let _ = tx.send(thunk().await);
        });

        let replaced = slots.insert(
            key.clone(),
            Slot {
                generation,
                timer: timer.abort_handle(),
            },
        );
        drop(slots);

        if let Some(previous) = replaced {
            previous.timer.abort();
            metrics::counter!(telemetry::DEBOUNCE_SUPERSEDED_TOTAL).increment(1);
            debug!(key = %key, "debounced call superseded");
        }

        async move { rx.await.unwrap_or(Err(SwitchyardError::Superseded)) }
    }

    /// Number of keys with a pending timer.
    pub fn pending(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Abort every pending timer, rejecting its caller with `Superseded`.
    pub fn cancel_all(&self) {
        for (_, slot) in lock(&self.slots).drain() {
            slot.timer.abort();
        }
    }
}

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
