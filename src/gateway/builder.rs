//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::Gateway;
use crate::cache::{CachesConfig, GatewayCaches};
use crate::config::GatewayConfig;
use crate::events::EventNotifier;
use crate::heuristic::LocalExtractor;
use crate::providers::{
    FallbackOrchestrator, ProviderDescriptor, ProviderRegistry, RequestExecutor, ReqwestTransport,
    Transport,
};
use crate::stats::StatsCollector;
use crate::store::KeyValueStore;
use crate::Result;

/// Main entry point for creating gateway instances.
pub struct Switchyard;

impl Switchyard {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> SwitchyardBuilder {
        SwitchyardBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// Anything not set explicitly comes from the [`GatewayConfig`] (or its
/// defaults when no config is given).
///
/// ```rust,no_run
/// use switchyard::{RequestGateway, RequestOptions, Switchyard};
///
/// # async fn run() -> switchyard::Result<()> {
/// let gateway = Switchyard::builder().build()?;
/// let keywords = gateway
///     .extract("Required: Rust and PostgreSQL.", &RequestOptions::default())
///     .await?;
/// println!("{:?}", keywords.high);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SwitchyardBuilder {
    config: Option<GatewayConfig>,
    descriptors: Vec<ProviderDescriptor>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn KeyValueStore>>,
    caches: Option<CachesConfig>,
    debounce_delay: Option<Duration>,
    fingerprint_prefix: Option<usize>,
    active_provider: Option<String>,
    heuristic_terms: Vec<String>,
}

impl SwitchyardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use settings from a loaded configuration.
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a provider. Once any provider is added, the config's
    /// provider table is ignored.
    pub fn provider(mut self, descriptor: ProviderDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Register several providers.
    pub fn providers(mut self, descriptors: impl IntoIterator<Item = ProviderDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Replace the HTTP transport (default: [`ReqwestTransport`]).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Persist the active provider through `store`.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn caches(mut self, caches: CachesConfig) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = Some(delay);
        self
    }

    /// Number of leading characters used in content fingerprints.
    pub fn fingerprint_prefix(mut self, chars: usize) -> Self {
        self.fingerprint_prefix = Some(chars);
        self
    }

    /// Provider tried first when a request names none.
    pub fn active_provider(mut self, id: impl Into<String>) -> Self {
        self.active_provider = Some(id.into());
        self
    }

    /// Extra vocabulary for the offline extractor.
    pub fn heuristic_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.heuristic_terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Build the gateway.
    ///
    /// Fails with `NoProvider` when no providers are configured, and with
    /// `Configuration` or `ProviderNotFound` for inconsistent settings.
    pub fn build(self) -> Result<Gateway> {
        let config = self.config.unwrap_or_default();

        let descriptors = if self.descriptors.is_empty() {
            config.descriptors()
        } else {
            self.descriptors
        };

        let notifier = EventNotifier::new(config.gateway.event_capacity);
        let mut registry = ProviderRegistry::new(descriptors)?.with_notifier(notifier.clone());
        if let Some(store) = self.store {
            registry = registry.with_store(store);
        }
        if let Some(id) = self
            .active_provider
            .as_deref()
            .or(config.gateway.active_provider.as_deref())
        {
            registry = registry.with_active(id)?;
        }
        let registry = Arc::new(registry);

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let stats = Arc::new(StatsCollector::new());
        let executor = RequestExecutor::new(transport, stats.clone());

        let mut orchestrator =
            FallbackOrchestrator::new(registry.clone(), executor, notifier.clone());
        if !self.heuristic_terms.is_empty() {
            orchestrator = orchestrator
                .with_local_extractor(LocalExtractor::new().with_terms(self.heuristic_terms));
        }

        let caches = GatewayCaches::new(&self.caches.unwrap_or_else(|| config.caches()));

        Ok(Gateway::new(
            orchestrator,
            registry,
            stats,
            caches,
            notifier,
            self.fingerprint_prefix
                .unwrap_or(config.gateway.fingerprint_prefix),
            self.debounce_delay.unwrap_or_else(|| config.debounce_delay()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;
    use crate::SwitchyardError;

    fn local(id: &str, priority: u32) -> ProviderDescriptor {
        ProviderDescriptor::new(id, ProviderKind::Ollama, "http://localhost:11434/api/chat", "m")
            .priority(priority)
    }

    #[test]
    fn builder_with_defaults_uses_builtin_providers() {
        let gateway = Switchyard::builder().build().unwrap();
        assert_eq!(gateway.providers().len(), 5);
        assert_eq!(gateway.active_provider(), "openai");
    }

    #[test]
    fn explicit_providers_replace_config_table() {
        let gateway = Switchyard::builder()
            .provider(local("b", 1))
            .provider(local("a", 0))
            .build()
            .unwrap();
        let ids: Vec<_> = gateway.providers().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn active_provider_override_is_validated() {
        let result = Switchyard::builder()
            .provider(local("a", 0))
            .active_provider("missing")
            .build();
        assert!(matches!(result, Err(SwitchyardError::ProviderNotFound(_))));
    }

    #[test]
    fn active_provider_from_config() {
        let config = GatewayConfig::parse("[gateway]\nactive_provider = \"b\"\n").unwrap();
        let gateway = Switchyard::builder()
            .config(config)
            .provider(local("a", 0))
            .provider(local("b", 1))
            .build()
            .unwrap();
        assert_eq!(gateway.active_provider(), "b");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = Switchyard::builder()
            .provider(local("a", 0))
            .provider(local("a", 1))
            .build();
        assert!(matches!(result, Err(SwitchyardError::Configuration(_))));
    }
}
