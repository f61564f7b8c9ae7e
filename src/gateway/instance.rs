//! Gateway - cache, debounce and fallback wired around one provider registry

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, instrument};

use crate::cache::{GatewayCaches, fingerprint};
use crate::debounce::Debouncer;
use crate::events::{EventNotifier, GatewayEvent};
use crate::providers::{FallbackOrchestrator, ProviderDescriptor, ProviderRegistry};
use crate::stats::{ProviderStats, StatsCollector};
use crate::types::{CanonicalResult, Operation, RequestEnvelope};
use crate::{
    AnswerResult, KeywordResult, RequestGateway, RequestOptions, Result, SwitchyardError,
    TextResult,
};

/// A resilient request gateway.
///
/// Cheap to clone; clones share caches, stats, debounce slots and the
/// shutdown token. Independent instances share nothing.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

struct Inner {
    orchestrator: FallbackOrchestrator,
    registry: Arc<ProviderRegistry>,
    stats: Arc<StatsCollector>,
    caches: GatewayCaches,
    debouncer: Debouncer,
    notifier: EventNotifier,
    shutdown: CancellationToken,
    fingerprint_prefix: usize,
    debounce_delay: Duration,
}

impl Gateway {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        orchestrator: FallbackOrchestrator,
        registry: Arc<ProviderRegistry>,
        stats: Arc<StatsCollector>,
        caches: GatewayCaches,
        notifier: EventNotifier,
        fingerprint_prefix: usize,
        debounce_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                orchestrator,
                registry,
                stats,
                caches,
                debouncer: Debouncer::new(),
                notifier,
                shutdown: CancellationToken::new(),
                fingerprint_prefix,
                debounce_delay,
            }),
        }
    }

    // ===== Providers =====

    /// All providers in priority order.
    pub fn providers(&self) -> &[Arc<ProviderDescriptor>] {
        self.inner.registry.list()
    }

    pub fn describe(&self, id: &str) -> Result<Arc<ProviderDescriptor>> {
        self.inner.registry.describe(id)
    }

    /// Provider tried first when a request names none.
    pub fn active_provider(&self) -> String {
        self.inner.registry.get_active()
    }

    /// Change (and persist) the active provider.
    pub async fn set_active_provider(&self, id: &str) -> Result<()> {
        self.inner.registry.set_active(id).await
    }

    /// Re-apply the persisted active provider, if any.
    pub async fn restore_active_provider(&self) -> Option<String> {
        let restored = self.inner.registry.restore_active().await;
        if let Some(id) = &restored {
            info!(provider = %id, "restored active provider");
        }
        restored
    }

    // ===== Stats =====

    pub fn stats(&self) -> BTreeMap<String, ProviderStats> {
        self.inner.stats.snapshot()
    }

    pub fn provider_stats(&self, id: &str) -> Option<ProviderStats> {
        self.inner.stats.get(id)
    }

    pub fn clear_stats(&self) {
        self.inner.stats.clear();
    }

    // ===== Caches =====

    /// Store the profile for `subject`, replacing any other subject's.
    pub fn set_profile(&self, subject: &str, profile: serde_json::Value) {
        self.inner.caches.profile.set(subject, profile);
    }

    /// Cached profile for `subject`, if present and fresh.
    pub fn profile(&self, subject: &str) -> Option<serde_json::Value> {
        self.inner.caches.profile.get(subject)
    }

    /// Drop every cached entry in every namespace.
    pub fn clear_caches(&self) {
        let caches = &self.inner.caches;
        caches.clear_all();
        for namespace in [caches.source.name(), caches.content.name(), caches.profile.name()] {
            self.inner.notifier.publish(GatewayEvent::CacheCleared {
                namespace: namespace.to_string(),
            });
        }
        info!("caches cleared");
    }

    /// Direct access to the cache namespaces.
    pub fn caches(&self) -> &GatewayCaches {
        &self.inner.caches
    }

    // ===== Events & lifecycle =====

    /// Subscribe to provider and cache state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.notifier.subscribe()
    }

    /// Cancel every in-flight and future request and reject pending
    /// debounced calls.
    pub fn shutdown(&self) {
        info!("gateway shutting down");
        self.inner.shutdown.cancel();
        self.inner.debouncer.cancel_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    // ===== Debounced extraction =====

    /// Extraction coalesced per `key`: a repeat call within the debounce
    /// window rejects this one with `Superseded` and only the latest runs.
    pub async fn extract_debounced(
        &self,
        key: &str,
        text: impl Into<String>,
        options: RequestOptions,
    ) -> Result<KeywordResult> {
        let gateway = self.clone();
        let text = text.into();
        let pending = self
            .inner
            .debouncer
            .schedule(format!("extract:{key}"), self.inner.debounce_delay, move || async move {
                gateway.extract(&text, &options).await
            });
        pending.await
    }

    // ===== Internals =====

    /// Envelope carrying a token that fires on caller cancellation or
    /// gateway shutdown. Dropping the guard retires the token.
    fn envelope(&self, operation: Operation, options: &RequestOptions) -> (RequestEnvelope, DropGuard) {
        let token = self.inner.shutdown.child_token();
        if let Some(caller) = options.cancel.clone() {
            let linked = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = caller.cancelled() => linked.cancel(),
                    _ = linked.cancelled() => {}
                }
            });
        }
        let guard = token.clone().drop_guard();
        let options = options.clone().cancel(token);
        (RequestEnvelope::new(operation, options), guard)
    }

    fn content_key(&self, tag: &str, content: &str) -> String {
        format!("{tag}:{}", fingerprint(content, self.inner.fingerprint_prefix))
    }

    /// Source-id entry first, then the content fingerprint.
    fn cached(&self, source_key: Option<&str>, content_key: &str) -> Option<CanonicalResult> {
        let caches = &self.inner.caches;
        source_key
            .and_then(|key| caches.source.get(key))
            .or_else(|| caches.content.get(content_key))
    }

    fn store(&self, source_key: Option<&str>, content_key: &str, result: &CanonicalResult) {
        if result.is_degraded() {
            return;
        }
        let caches = &self.inner.caches;
        if let Some(key) = source_key {
            caches.source.set(key, result.clone());
        }
        caches.content.set(content_key, result.clone());
    }
}

fn unexpected(kind: &str) -> SwitchyardError {
    SwitchyardError::InvalidInput(format!("cached or produced result is not {kind}"))
}

#[async_trait]
impl RequestGateway for Gateway {
    #[instrument(skip(self, text, options), fields(operation = "extract", len = text.len()))]
    async fn extract(&self, text: &str, options: &RequestOptions) -> Result<KeywordResult> {
        if text.trim().is_empty() {
            return Ok(KeywordResult::default());
        }

        let source_key = options.source_id.as_deref().map(|id| format!("extract:{id}"));
        let content_key = self.content_key("extract", text);

        let hit = if options.skip_cache {
            None
        } else {
            self.cached(source_key.as_deref(), &content_key)
        };
        let result = match hit {
            Some(hit) => hit,
            None => {
                let (envelope, _guard) = self.envelope(
                    Operation::Extract {
                        text: text.to_string(),
                    },
                    options,
                );
                let result = self.inner.orchestrator.run(&envelope).await?;
                self.store(source_key.as_deref(), &content_key, &result);
                result
            }
        };

        let keywords = result.into_keywords().ok_or_else(|| unexpected("keywords"))?;
        Ok(match options.max_items {
            Some(max) => keywords.capped(max),
            None => keywords,
        })
    }

    #[instrument(skip(self, params, options), fields(operation = "generate"))]
    async fn generate_text(
        &self,
        operation: &str,
        params: &serde_json::Value,
        options: &RequestOptions,
    ) -> Result<TextResult> {
        if operation.trim().is_empty() {
            return Err(SwitchyardError::InvalidInput(
                "generation operation name is empty".to_string(),
            ));
        }
        let (envelope, _guard) = self.envelope(
            Operation::Generate {
                name: operation.to_string(),
                params: params.clone(),
            },
            options,
        );
        self.inner
            .orchestrator
            .run(&envelope)
            .await?
            .into_text()
            .ok_or_else(|| unexpected("text"))
    }

    #[instrument(skip(self, question, context, options), fields(operation = "answer"))]
    async fn answer(
        &self,
        question: &str,
        context: &str,
        options: &RequestOptions,
    ) -> Result<AnswerResult> {
        if question.trim().is_empty() {
            return Err(SwitchyardError::InvalidInput("question is empty".to_string()));
        }

        let content_key = self.content_key("answer", &format!("{question}\n{context}"));
        if !options.skip_cache
            && let Some(hit) = self.cached(None, &content_key)
        {
            return hit.into_answer().ok_or_else(|| unexpected("an answer"));
        }

        let (envelope, _guard) = self.envelope(
            Operation::Answer {
                question: question.to_string(),
                context: context.to_string(),
            },
            options,
        );
        let result = self.inner.orchestrator.run(&envelope).await?;
        self.store(None, &content_key, &result);
        result.into_answer().ok_or_else(|| unexpected("an answer"))
    }
}
