//! Ordered fallback across providers, ending in the offline heuristic.
//!
//! ```text
//!   NextProvider(0) ─ok──► normalized result
//!        │ exhausted
//!   NextProvider(1) ─ok──► normalized result
//!        │ exhausted
//!       ...
//!   Settle ──extract──► LocalExtractor (degraded)
//!          └─other────► AllProvidersExhausted
//! ```
//!
//! Each provider is tried at most once per request, in the order given by
//! [`ProviderRegistry::ordered_for`]. Providers that cannot serve the
//! operation (capability not declared, or key missing) are skipped without
//! an attempt. With fallback disabled only the first usable provider is
//! tried; an explicit override that cannot serve is a configuration error.
//! Cancellation stops the walk immediately.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::registry::ProviderRegistry;
use super::retry::{RequestExecutor, ResultCandidate};
use crate::events::{EventNotifier, GatewayEvent};
use crate::heuristic::{self, LocalExtractor};
use crate::normalize::{self, RawKeywords};
use crate::telemetry;
use crate::types::{CanonicalResult, Operation, RequestEnvelope};
use crate::{Result, SwitchyardError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NextProvider(usize),
    Settle,
}

/// Walks the provider order for one request.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    registry: Arc<ProviderRegistry>,
    executor: RequestExecutor,
    notifier: EventNotifier,
    local: Arc<LocalExtractor>,
}

impl FallbackOrchestrator {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        executor: RequestExecutor,
        notifier: EventNotifier,
    ) -> Self {
        Self {
            registry,
            executor,
            notifier,
            local: Arc::new(LocalExtractor::default()),
        }
    }

    /// Replace the offline extractor (e.g. with a larger vocabulary).
    pub fn with_local_extractor(mut self, local: LocalExtractor) -> Self {
        self.local = Arc::new(local);
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Run `envelope` to a canonical result.
    ///
    /// Extraction never fails once providers are exhausted: it degrades to
    /// the local heuristic. Generate and answer fail with
    /// `AllProvidersExhausted`.
    #[instrument(skip(self, envelope), fields(operation = envelope.operation.tag()))]
    pub async fn run(&self, envelope: &RequestEnvelope) -> Result<CanonicalResult> {
        let capability = envelope.operation.capability();
        let operation = envelope.operation.tag();

        let requested = envelope.options.provider.as_deref();
        let order = self.registry.ordered_for(requested)?;
        if !envelope.options.allow_fallback
            && let Some(id) = requested
            && let Some(first) = order.first()
            && !first.can_serve(capability)
        {
            return Err(SwitchyardError::Configuration(format!(
                "provider '{id}' cannot serve {operation} and fallback is disabled"
            )));
        }
        let mut candidates: Vec<_> = order
            .into_iter()
            .filter(|p| {
                let usable = p.can_serve(capability);
                if !usable {
                    debug!(provider = %p.id, operation, "provider skipped: cannot serve");
                }
                usable
            })
            .collect();
        if !envelope.options.allow_fallback {
            candidates.truncate(1);
        }

        let mut attempted = Vec::with_capacity(candidates.len());
        let mut last_cause: Option<Box<SwitchyardError>> = None;
        let mut phase = Phase::NextProvider(0);

        loop {
            match phase {
                Phase::NextProvider(index) => {
                    let Some(provider) = candidates.get(index) else {
                        phase = Phase::Settle;
                        continue;
                    };
                    attempted.push(provider.id.clone());

                    match self.executor.execute(provider, envelope).await {
                        Ok(candidate) => {
                            if index > 0 {
                                info!(
                                    provider = %candidate.provider,
                                    operation,
                                    attempts = candidate.attempts,
                                    latency_ms = candidate.latency.as_millis() as u64,
                                    skipped = index,
                                    "served by fallback provider"
                                );
                            }
                            return Ok(normalize(&envelope.operation, candidate));
                        }
                        Err(SwitchyardError::Cancelled) => return Err(SwitchyardError::Cancelled),
                        Err(e) => {
                            let has_next = index + 1 < candidates.len();
                            warn!(
                                provider = %provider.id,
                                operation,
                                error = %e,
                                falling_back = has_next,
                                "provider exhausted"
                            );
                            metrics::counter!(telemetry::FALLBACKS_TOTAL,
                                "from" => provider.id.clone(),
                                "operation" => operation,
                            )
                            .increment(1);
                            self.notifier.publish(GatewayEvent::ProviderFailed {
                                provider: provider.id.clone(),
                                operation: operation.to_string(),
                                error: e.to_string(),
                            });
                            last_cause = Some(Box::new(e));
                            phase = Phase::NextProvider(index + 1);
                        }
                    }
                }
                Phase::Settle => {
                    return match &envelope.operation {
                        Operation::Extract { text } => {
                            warn!(operation, ?attempted, "all providers failed, using offline extraction");
                            metrics::counter!(telemetry::DEGRADED_TOTAL, "operation" => operation)
                                .increment(1);
                            self.notifier.publish(GatewayEvent::Degraded {
                                operation: operation.to_string(),
                            });
                            Ok(CanonicalResult::Keywords(self.local.extract(text)))
                        }
                        _ if attempted.is_empty() => Err(SwitchyardError::NoProvider),
                        _ => Err(SwitchyardError::AllProvidersExhausted {
                            attempted,
                            last_cause,
                        }),
                    };
                }
            }
        }
    }
}

/// Turn a provider's completion into the operation's canonical result.
fn normalize(operation: &Operation, candidate: ResultCandidate) -> CanonicalResult {
    let ResultCandidate { provider, text, .. } = candidate;
    match operation {
        Operation::Extract { text: input } => CanonicalResult::Keywords(
            normalize::normalize_keywords(RawKeywords::from_text(&text))
                .provider(provider)
                .signals(heuristic::signals(input)),
        ),
        Operation::Answer { .. } => {
            let mut answer = normalize::normalize_answer(&text);
            answer.provider = Some(provider);
            CanonicalResult::Answer(answer)
        }
        Operation::Generate { name, .. } => {
            let mut generated = normalize::normalize_text(name, &text);
            generated.provider = Some(provider);
            CanonicalResult::Text(generated)
        }
    }
}
