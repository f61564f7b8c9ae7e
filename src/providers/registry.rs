//! Provider registry with priority ordering and an active default.
//!
//! The `ProviderRegistry` stores immutable descriptors sorted by priority
//! rank (lowest rank first; registration order breaks ties). One provider is
//! *active*: it is tried first unless the caller names another.
//!
//! # Fallback order
//!
//! ```text
//! ordered_for(Some("c"))      ordered_for(None), active = "b"
//!   c ─► a ─► b ─► d            b ─► a ─► c ─► d
//! ```
//!
//! The preferred (or active) provider goes first; everything else follows in
//! priority order. Each provider appears exactly once.
//!
//! # Persistence
//!
//! `set_active` saves the choice through an optional [`KeyValueStore`] and
//! `restore_active` reads it back. Store failures are logged and ignored so
//! the registry keeps working in memory.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use super::descriptor::ProviderDescriptor;
use crate::events::{EventNotifier, GatewayEvent};
use crate::store::{ACTIVE_PROVIDER_KEY, KeyValueStore};
use crate::{Result, SwitchyardError};

/// Registry of provider descriptors.
pub struct ProviderRegistry {
    providers: Vec<Arc<ProviderDescriptor>>,
    active: RwLock<String>,
    store: Option<Arc<dyn KeyValueStore>>,
    notifier: EventNotifier,
}

impl ProviderRegistry {
    /// Build a registry from descriptors.
    ///
    /// Fails with `NoProvider` when `descriptors` is empty and with
    /// `Configuration` when two descriptors share an id. The highest-priority
    /// provider starts out active.
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> Result<Self> {
        let mut providers: Vec<Arc<ProviderDescriptor>> =
            descriptors.into_iter().map(Arc::new).collect();
        // Stable sort: equal ranks keep registration order.
        providers.sort_by_key(|p| p.priority);

        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.id == provider.id) {
                return Err(SwitchyardError::Configuration(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
        }

        let active = providers
            .first()
            .map(|p| p.id.clone())
            .ok_or(SwitchyardError::NoProvider)?;

        Ok(Self {
            providers,
            active: RwLock::new(active),
            store: None,
            notifier: EventNotifier::default(),
        })
    }

    /// Persist the active provider through `store`.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Announce active-provider changes on `notifier`.
    pub fn with_notifier(mut self, notifier: EventNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Start with `id` active instead of the highest-priority provider.
    ///
    /// Nothing is persisted or announced.
    pub fn with_active(self, id: &str) -> Result<Self> {
        let descriptor = self.describe(id)?;
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = descriptor.id.clone();
        Ok(self)
    }

    /// Look up a descriptor by id.
    pub fn describe(&self, id: &str) -> Result<Arc<ProviderDescriptor>> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| SwitchyardError::ProviderNotFound(id.to_string()))
    }

    /// All descriptors in priority order.
    pub fn list(&self) -> &[Arc<ProviderDescriptor>] {
        &self.providers
    }

    /// Id of the current default provider.
    pub fn get_active(&self) -> String {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the default provider and persist the choice.
    ///
    /// Unknown ids are rejected. Persistence failures do not fail the call.
    pub async fn set_active(&self, id: &str) -> Result<()> {
        let descriptor = self.describe(id)?;
        {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            *active = descriptor.id.clone();
        }
        info!(provider = id, "active provider changed");

        if let Some(store) = &self.store
            && let Err(e) = store.save(ACTIVE_PROVIDER_KEY, id).await
        {
            warn!(provider = id, error = %e, "failed to persist active provider");
        }

        self.notifier.publish(GatewayEvent::ActiveProviderChanged {
            provider: descriptor.id.clone(),
        });
        Ok(())
    }

    /// Load the persisted active provider, if any.
    ///
    /// Returns the restored id. Missing stores, missing keys, store errors and
    /// ids that are no longer registered all leave the current choice in
    /// place and return `None`.
    pub async fn restore_active(&self) -> Option<String> {
        let store = self.store.as_ref()?;
        let saved = match store.load(ACTIVE_PROVIDER_KEY).await {
            Ok(saved) => saved?,
            Err(e) => {
                warn!(error = %e, "failed to load active provider; keeping default");
                return None;
            }
        };
        if self.describe(&saved).is_err() {
            warn!(provider = %saved, "persisted provider is not registered; keeping default");
            return None;
        }
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = saved.clone();
        Some(saved)
    }

    /// Providers in the order a request should try them.
    ///
    /// `preferred` (or, when `None`, the active provider) comes first,
    /// followed by the rest in priority order.
    pub fn ordered_for(&self, preferred: Option<&str>) -> Result<Vec<Arc<ProviderDescriptor>>> {
        let first = match preferred {
            Some(id) => self.describe(id)?,
            None => self.describe(&self.get_active())?,
        };
        let mut ordered = Vec::with_capacity(self.providers.len());
        ordered.push(first.clone());
        ordered.extend(
            self.providers
                .iter()
                .filter(|p| p.id != first.id)
                .cloned(),
        );
        Ok(ordered)
    }
}
