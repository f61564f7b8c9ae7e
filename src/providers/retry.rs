//! Single-provider execution with bounded retries and exponential backoff.
//!
//! [`RequestExecutor::execute`] drives one provider through an explicit
//! state machine:
//!
//! ```text
//!   Attempting(n) ──ok──────────────────────────► candidate
//!        │ failure / timeout
//!        ├── n + 1 < budget ──► Backoff(n) ──sleep base·2ⁿ──► Attempting(n + 1)
//!        └── budget spent ───► ProviderExhausted { attempts: n + 1, last_cause }
//! ```
//!
//! Every attempt runs under the descriptor's hard deadline. A timeout uses
//! up a retry slot like any other failure and is reported as `Timeout`.
//! Cancellation is checked before each attempt and raced against both the
//! attempt and the backoff sleep; a cancelled request returns `Cancelled`
//! and the interrupted attempt is not recorded as a provider failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::descriptor::ProviderDescriptor;
use super::traits::{HttpRequest, Transport};
use super::wire;
use crate::prompts;
use crate::stats::{AttemptOutcome, StatsCollector};
use crate::telemetry;
use crate::types::RequestEnvelope;
use crate::{Result, SwitchyardError};

/// Longest response body kept in an `Http` error.
const MAX_ERROR_BODY: usize = 512;

/// Raw completion produced by one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCandidate {
    pub provider: String,
    /// Completion text, not yet normalized.
    pub text: String,
    /// Number of attempts it took, including the successful one.
    pub attempts: u32,
    /// Latency of the successful attempt.
    pub latency: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptState {
    Attempting { attempt: u32 },
    Backoff { attempt: u32 },
}

/// Calls one provider at a time, with retry, backoff and per-attempt deadlines.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    stats: Arc<StatsCollector>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, stats: Arc<StatsCollector>) -> Self {
        Self { transport, stats }
    }

    /// Stats table this executor records into.
    pub fn stats(&self) -> &Arc<StatsCollector> {
        &self.stats
    }

    /// Run `envelope` against `descriptor` until success or budget exhaustion.
    ///
    /// Fails with `ProviderExhausted` after `descriptor.retry_budget` failed
    /// attempts, or `Cancelled` when the envelope's token fires.
    pub async fn execute(
        &self,
        descriptor: &ProviderDescriptor,
        envelope: &RequestEnvelope,
    ) -> Result<ResultCandidate> {
        let cancel = envelope.options.cancel.clone().unwrap_or_default();
        let operation = envelope.operation.tag();
        let request = wire::build_request(descriptor, &prompts::render(&envelope.operation));
        let budget = descriptor.retry_budget.max(1);

        let mut state = AttemptState::Attempting { attempt: 0 };
        loop {
            match state {
                AttemptState::Attempting { attempt } => {
                    if cancel.is_cancelled() {
                        return Err(SwitchyardError::Cancelled);
                    }

                    let start = Instant::now();
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(SwitchyardError::Cancelled),
                        outcome = tokio::time::timeout(
                            descriptor.timeout,
                            self.attempt(descriptor, request.clone()),
                        ) => outcome,
                    };
                    let latency = start.elapsed();

                    let cause = match outcome {
                        Ok(Ok(text)) => {
                            self.record(descriptor, operation, AttemptOutcome::Success, latency);
                            debug!(
                                provider = %descriptor.id,
                                operation,
                                attempt = attempt + 1,
                                latency_ms = latency.as_millis() as u64,
                                "provider call succeeded"
                            );
                            return Ok(ResultCandidate {
                                provider: descriptor.id.clone(),
                                text,
                                attempts: attempt + 1,
                                latency,
                            });
                        }
                        Ok(Err(e)) => {
                            self.record(descriptor, operation, AttemptOutcome::Failure, latency);
                            e
                        }
                        Err(_) => {
                            self.record(descriptor, operation, AttemptOutcome::Timeout, latency);
                            SwitchyardError::Timeout {
                                provider: descriptor.id.clone(),
                                timeout: descriptor.timeout,
                            }
                        }
                    };

                    warn!(
                        provider = %descriptor.id,
                        transport = self.transport.name(),
                        operation,
                        attempt = attempt + 1,
                        max_attempts = budget,
                        timed_out = cause.is_timeout(),
                        error = %cause,
                        "provider attempt failed"
                    );

                    if attempt + 1 >= budget {
                        return Err(SwitchyardError::ProviderExhausted {
                            provider: descriptor.id.clone(),
                            attempts: attempt + 1,
                            last_cause: Box::new(cause),
                        });
                    }
                    state = AttemptState::Backoff { attempt };
                }
                AttemptState::Backoff { attempt } => {
                    let delay = descriptor.backoff_for_attempt(attempt);
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "provider" => descriptor.id.clone(),
                        "operation" => operation,
                    )
                    .increment(1);
                    debug!(
                        provider = %descriptor.id,
                        operation,
                        delay_ms = delay.as_millis() as u64,
                        "backing off before retry"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(SwitchyardError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    state = AttemptState::Attempting {
                        attempt: attempt + 1,
                    };
                }
            }
        }
    }

    /// One network exchange, classified into completion text or a failure.
    async fn attempt(&self, descriptor: &ProviderDescriptor, request: HttpRequest) -> Result<String> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(SwitchyardError::Http {
                status: response.status,
                body: truncate(response.body, MAX_ERROR_BODY),
            });
        }
        wire::extract_text(descriptor.kind, &response.body)
    }

    fn record(
        &self,
        descriptor: &ProviderDescriptor,
        operation: &'static str,
        outcome: AttemptOutcome,
        latency: Duration,
    ) {
        self.stats.record(&descriptor.id, outcome, latency);

        let status = match outcome {
            AttemptOutcome::Success => "ok",
            AttemptOutcome::Failure => "error",
            AttemptOutcome::Timeout => "timeout",
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => descriptor.id.clone(),
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        match outcome {
            AttemptOutcome::Success => {
                metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
                    "provider" => descriptor.id.clone(),
                    "operation" => operation,
                )
                .record(latency.as_secs_f64());
            }
            AttemptOutcome::Timeout => {
                metrics::counter!(telemetry::TIMEOUTS_TOTAL,
                    "provider" => descriptor.id.clone(),
                    "operation" => operation,
                )
                .increment(1);
            }
            AttemptOutcome::Failure => {}
        }
    }
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
