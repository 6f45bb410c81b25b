//! Typed model lifecycle hooks.
//!
//! Hooks are stored per record type. Only the `creating` event exists: it
//! fires before a new record is persisted and may mutate it or abort the
//! insert by returning an error.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::error::Result;
use crate::model::Model;

/// A hook run before a record of type `M` is inserted.
pub type CreatingHook<M> = Arc<dyn Fn(&mut M) -> Result<()> + Send + Sync>;

/// Registry of lifecycle hooks, keyed by record type.
#[derive(Default)]
pub struct ModelEvents {
    creating: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for ModelEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEvents")
            .field("creating_types", &self.creating.len())
            .finish()
    }
}

impl ModelEvents {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `creating` hook for `M`. Hooks run in registration order.
    pub fn creating<M, F>(&self, hook: F)
    where
        M: Model,
        F: Fn(&mut M) -> Result<()> + Send + Sync + 'static,
    {
        let hook: CreatingHook<M> = Arc::new(hook);
        let mut entry = self
            .creating
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(Vec::<CreatingHook<M>>::new()));
        if let Some(hooks) = entry.downcast_mut::<Vec<CreatingHook<M>>>() {
            hooks.push(hook);
        }
    }

    /// Run every `creating` hook registered for `M`, stopping at the first
    /// error.
    pub fn fire_creating<M: Model>(&self, record: &mut M) -> Result<()> {
        let hooks = self.hooks_for::<M>();
        trace!(entity = %record.entity_name(), hooks = hooks.len(), "firing creating hooks");
        for hook in hooks {
            hook(&mut *record)?;
        }
        Ok(())
    }

    /// Number of `creating` hooks registered for `M`.
    pub fn creating_count<M: Model>(&self) -> usize {
        self.creating
            .get(&TypeId::of::<M>())
            .and_then(|entry| entry.downcast_ref::<Vec<CreatingHook<M>>>().map(Vec::len))
            .unwrap_or(0)
    }

    // Cloned out so hooks may register further hooks without deadlocking.
    fn hooks_for<M: Model>(&self) -> Vec<CreatingHook<M>> {
        self.creating
            .get(&TypeId::of::<M>())
            .and_then(|entry| entry.downcast_ref::<Vec<CreatingHook<M>>>().cloned())
            .unwrap_or_default()
    }
}
