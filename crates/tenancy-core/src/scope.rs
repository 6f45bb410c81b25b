//! Named global scopes applied to every read query of an entity.
//!
//! A scope is a closure evaluated when a query is built, not when the scope
//! is registered, so it always sees the context's current state.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tenancy_proto::FilterExpr;
use tracing::trace;

type ScopeFn = dyn Fn() -> FilterExpr + Send + Sync;

/// A named filter producer attached to an entity type.
#[derive(Clone)]
pub struct GlobalScope {
    name: String,
    apply: Arc<ScopeFn>,
}

impl GlobalScope {
    /// Create a scope from a closure.
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn() -> FilterExpr + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    /// Scope name, unique per entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the scope into a filter.
    pub fn resolve(&self) -> FilterExpr {
        (self.apply)()
    }
}

impl fmt::Debug for GlobalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalScope")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Per-context registry of global scopes, keyed by entity name.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: DashMap<String, Vec<GlobalScope>>,
}

impl ScopeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a scope to an entity. A scope with the same name is replaced.
    ///
    /// Returns `true` if an existing scope was replaced.
    pub fn add_global_scope(&self, entity: &str, scope: GlobalScope) -> bool {
        trace!(entity = %entity, scope = %scope.name(), "adding global scope");
        let mut scopes = self.scopes.entry(entity.to_string()).or_default();
        match scopes.iter_mut().find(|s| s.name == scope.name) {
            Some(existing) => {
                *existing = scope;
                true
            }
            None => {
                scopes.push(scope);
                false
            }
        }
    }

    /// Detach a scope from an entity.
    pub fn remove_global_scope(&self, entity: &str, name: &str) -> bool {
        match self.scopes.get_mut(entity) {
            Some(mut scopes) => {
                let before = scopes.len();
                scopes.retain(|s| s.name != name);
                scopes.len() != before
            }
            None => false,
        }
    }

    /// Check whether an entity has the named scope.
    pub fn has_global_scope(&self, entity: &str, name: &str) -> bool {
        self.scopes
            .get(entity)
            .is_some_and(|scopes| scopes.iter().any(|s| s.name == name))
    }

    /// Scopes of an entity, in registration order.
    pub fn scopes_for(&self, entity: &str) -> Vec<GlobalScope> {
        self.scopes
            .get(entity)
            .map(|scopes| scopes.clone())
            .unwrap_or_default()
    }

    /// Names of an entity's scopes, in registration order.
    pub fn scope_names(&self, entity: &str) -> Vec<String> {
        self.scopes_for(entity)
            .into_iter()
            .map(|s| s.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_add_and_resolve() {
        let registry = ScopeRegistry::new();
        let replaced = registry.add_global_scope(
            "Invoice",
            GlobalScope::new("org_id", || FilterExpr::eq("invoices.org_id", 42i64)),
        );

        assert!(!replaced);
        assert!(registry.has_global_scope("Invoice", "org_id"));
        assert!(!registry.has_global_scope("Invoice", "team_id"));
        assert!(!registry.has_global_scope("Project", "org_id"));

        let scopes = registry.scopes_for("Invoice");
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].resolve(), FilterExpr::eq("invoices.org_id", 42i64));
    }

    #[test]
    fn test_same_name_replaces() {
        let registry = ScopeRegistry::new();
        registry.add_global_scope("Invoice", GlobalScope::new("org_id", || FilterExpr::eq("org_id", 1i64)));
        registry.add_global_scope("Invoice", GlobalScope::new("team_id", || FilterExpr::eq("team_id", 2i64)));
        let replaced = registry.add_global_scope(
            "Invoice",
            GlobalScope::new("org_id", || FilterExpr::eq("org_id", 3i64)),
        );

        assert!(replaced);
        assert_eq!(registry.scope_names("Invoice"), vec!["org_id", "team_id"]);
        assert_eq!(
            registry.scopes_for("Invoice")[0].resolve(),
            FilterExpr::eq("org_id", 3i64)
        );
    }

    #[test]
    fn test_resolved_at_evaluation_time() {
        let current = Arc::new(AtomicI64::new(1));
        let captured = Arc::clone(&current);
        let scope = GlobalScope::new("org_id", move || {
            FilterExpr::eq("org_id", captured.load(Ordering::SeqCst))
        });

        assert_eq!(scope.resolve(), FilterExpr::eq("org_id", 1i64));
        current.store(2, Ordering::SeqCst);
        assert_eq!(scope.resolve(), FilterExpr::eq("org_id", 2i64));
    }

    #[test]
    fn test_remove_global_scope() {
        let registry = ScopeRegistry::new();
        registry.add_global_scope("Invoice", GlobalScope::new("org_id", || FilterExpr::eq("org_id", 1i64)));

        assert!(registry.remove_global_scope("Invoice", "org_id"));
        assert!(!registry.remove_global_scope("Invoice", "org_id"));
        assert!(!registry.remove_global_scope("Project", "org_id"));
        assert!(registry.scopes_for("Invoice").is_empty());
    }
}
