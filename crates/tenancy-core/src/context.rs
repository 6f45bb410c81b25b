//! Tenancy context.
//!
//! One context per unit of work (typically a request). It owns the service
//! container the tenant manager is bound in, the global scopes installed on
//! entity types and their lifecycle hooks. Nothing is process-global, so two
//! contexts never see each other's tenants.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::config::TenancyConfig;
use crate::container::ServiceContainer;
use crate::entity::BootState;
use crate::error::Result;
use crate::events::ModelEvents;
use crate::scope::ScopeRegistry;
use crate::tenant::TenantManager;

/// Per-unit-of-work tenancy state.
#[derive(Debug)]
pub struct TenancyContext {
    config: TenancyConfig,
    container: ServiceContainer,
    scopes: ScopeRegistry,
    events: ModelEvents,
    booted: DashMap<TypeId, BootState>,
}

impl Default for TenancyContext {
    fn default() -> Self {
        Self::build(TenancyConfig::default())
    }
}

impl TenancyContext {
    /// Create a context with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the given configuration.
    pub fn with_config(config: TenancyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: TenancyConfig) -> Self {
        let container = ServiceContainer::new();
        container.bind_singleton(
            config.service_name.clone(),
            Arc::new(TenantManager::new(config.clone())),
        );
        debug!(service = %config.service_name, "tenancy context created");
        Self {
            config,
            container,
            scopes: ScopeRegistry::new(),
            events: ModelEvents::new(),
            booted: DashMap::new(),
        }
    }

    /// The tenant manager bound in this context.
    pub fn tenancy(&self) -> Result<Arc<TenantManager>> {
        self.container.resolve::<TenantManager>(&self.config.service_name)
    }

    /// Configuration of this context.
    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    /// Service container.
    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Global scope registry.
    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// Lifecycle hook registry.
    pub fn events(&self) -> &ModelEvents {
        &self.events
    }

    /// How the record type `M` was activated in this context.
    pub fn boot_state<M: 'static>(&self) -> BootState {
        self.booted
            .get(&TypeId::of::<M>())
            .map(|state| *state)
            .unwrap_or(BootState::Unregistered)
    }

    pub(crate) fn booted(&self) -> &DashMap<TypeId, BootState> {
        &self.booted
    }
}
