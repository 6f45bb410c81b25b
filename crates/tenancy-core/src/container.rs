//! Named service container.
//!
//! Services are bound once as shared singletons and resolved by name with
//! a checked downcast.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

/// Singleton registry keyed by service name.
#[derive(Default)]
pub struct ServiceContainer {
    services: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let services = self.services.read();
        let mut names: Vec<&String> = services.keys().collect();
        names.sort();
        f.debug_struct("ServiceContainer")
            .field("services", &names)
            .finish()
    }
}

impl ServiceContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a shared instance under `name`, replacing any previous binding.
    pub fn bind_singleton<T>(&self, name: impl Into<String>, service: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let name = name.into();
        debug!(service = %name, "binding singleton");
        self.services.write().insert(name, service);
    }

    /// Resolve the instance bound under `name`.
    pub fn resolve<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let service = self
            .services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ServiceNotBound(name.to_string()))?;
        service
            .downcast::<T>()
            .map_err(|_| Error::ServiceTypeMismatch(name.to_string()))
    }

    /// Whether anything is bound under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }
}
