//! Tenant manager.
//!
//! Holds the tenants active for one unit of work, installs tenant scopes on
//! entity types and stamps tenant columns on new records.

use std::sync::Arc;

use parking_lot::RwLock;
use tenancy_proto::{FilterExpr, Value};
use tracing::{debug, trace};

use super::assignments::TenantAssignments;
use super::source::TenantSource;
use crate::config::{ScopeValuePolicy, TenancyConfig};
use crate::error::{Error, Result};
use crate::model::TenantScoped;
use crate::scope::{GlobalScope, ScopeRegistry};

/// The operation that found no tenant registered and deferred a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredStage {
    /// Scope installation at type activation.
    ScopeInstall,
    /// Tenant column stamping before insert.
    Creating,
}

/// A record seen before any tenant was registered.
///
/// Kept as a marker only; nothing replays it once tenants arrive.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredEntity {
    /// Entity type name.
    pub entity: String,
    /// Primary key at the time of deferral (`Null` for unsaved records).
    pub key: Value,
    /// The operation that deferred.
    pub stage: DeferredStage,
}

/// Result of [`TenantManager::add_tenant_scopes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeInstall {
    /// Scopes were installed for these columns (possibly none).
    Installed(Vec<String>),
    /// No tenant was registered; the record was deferred.
    Deferred,
}

#[derive(Debug, Default)]
struct ManagerState {
    tenants: TenantAssignments,
    deferred: Vec<DeferredEntity>,
}

/// Registry of active tenants for one unit of work.
///
/// Cloning yields another handle to the same state; installed scopes hold
/// such a handle so they read live assignments when queries are built.
#[derive(Debug, Clone)]
pub struct TenantManager {
    state: Arc<RwLock<ManagerState>>,
    config: Arc<TenancyConfig>,
}

impl Default for TenantManager {
    fn default() -> Self {
        Self::new(TenancyConfig::default())
    }
}

impl TenantManager {
    /// Create a manager with no tenants.
    pub fn new(config: TenancyConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ManagerState::default())),
            config: Arc::new(config),
        }
    }

    /// Configuration this manager was created with.
    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    /// Register a tenant to scope by.
    ///
    /// An explicit `id` always wins over the key of a record source. A null
    /// identifier is rejected before the column is resolved.
    pub fn add_tenant(&self, source: impl Into<TenantSource>, id: impl Into<Value>) -> Result<()> {
        let source = source.into();
        let id = id.into();
        if id.is_null() {
            return Err(Error::TenantNullIdentifier {
                column: Self::describe(&source),
            });
        }
        let column = source.tenant_key()?.to_string();
        self.put_tenant(column, id);
        Ok(())
    }

    /// Register a tenant record: column from its foreign key, identifier from
    /// its primary key.
    pub fn add_tenant_record<M: crate::model::Model>(&self, record: &M) -> Result<()> {
        let source = TenantSource::record(record);
        let id = source.implied_id().cloned().unwrap_or(Value::Null);
        self.add_tenant(source, id)
    }

    /// Whether a tenant is registered for the column derived from `source`.
    pub fn has_tenant(&self, source: impl Into<TenantSource>) -> Result<bool> {
        let source = source.into();
        let column = source.tenant_key()?;
        Ok(self.state.read().tenants.contains(column))
    }

    /// Identifier registered for the column derived from `source`.
    pub fn tenant_id(&self, source: impl Into<TenantSource>) -> Result<Option<Value>> {
        let source = source.into();
        let column = source.tenant_key()?;
        Ok(self.state.read().tenants.get(column).cloned())
    }

    /// Drop a tenant registration. Scopes already installed keep filtering
    /// by the identifier they captured.
    pub fn remove_tenant(&self, source: impl Into<TenantSource>) -> Result<bool> {
        let source = source.into();
        let column = source.tenant_key()?;
        let removed = self.state.write().tenants.remove(column);
        if removed.is_some() {
            debug!(column = %column, "tenant removed");
        }
        Ok(removed.is_some())
    }

    /// Snapshot of the current assignments.
    pub fn get_tenants(&self) -> TenantAssignments {
        self.state.read().tenants.clone()
    }

    /// Snapshot of deferred records.
    pub fn deferred(&self) -> Vec<DeferredEntity> {
        self.state.read().deferred.clone()
    }

    /// Whether any record was deferred.
    pub fn has_deferred(&self) -> bool {
        !self.state.read().deferred.is_empty()
    }

    /// Install a global scope on the model's entity type for each declared
    /// tenant column that has a registered tenant.
    ///
    /// With no tenants registered the model is deferred and nothing is
    /// installed.
    pub fn add_tenant_scopes<M: TenantScoped>(
        &self,
        model: &M,
        scopes: &ScopeRegistry,
    ) -> Result<ScopeInstall> {
        let columns = model.get_tenant_columns()?;

        let applicable = {
            let mut state = self.state.write();
            if state.tenants.is_empty() {
                Self::defer(&mut state, model, DeferredStage::ScopeInstall);
                return Ok(ScopeInstall::Deferred);
            }
            state.tenants.only(columns)
        };

        let mut installed = Vec::with_capacity(applicable.len());
        for (column, id) in applicable {
            let qualified = model.qualified_tenant(&column);
            let manager = self.clone();
            scopes.add_global_scope(
                model.entity_name(),
                GlobalScope::new(column.clone(), move || {
                    FilterExpr::eq(qualified.clone(), manager.scope_value(&id))
                }),
            );
            debug!(entity = %model.entity_name(), column = %column, "tenant scope installed");
            installed.push(column);
        }

        Ok(ScopeInstall::Installed(installed))
    }

    /// Fill in tenant columns on a new record before it is inserted.
    ///
    /// Columns that already hold a non-null value are left alone. Returns the
    /// columns that were stamped.
    pub fn new_tenant_model<M: TenantScoped>(&self, model: &mut M) -> Result<Vec<String>> {
        let columns = model.get_tenant_columns()?;

        let applicable = {
            let mut state = self.state.write();
            if state.tenants.is_empty() {
                Self::defer(&mut state, model, DeferredStage::Creating);
                return Ok(Vec::new());
            }
            state.tenants.only(columns)
        };

        let mut stamped = Vec::new();
        for (column, id) in applicable {
            if model.get_attribute(&column).is_some_and(|v| !v.is_null()) {
                continue;
            }
            trace!(entity = %model.entity_name(), column = %column, id = %id, "stamping tenant column");
            model.set_attribute(&column, id);
            stamped.push(column);
        }

        Ok(stamped)
    }

    /// Identifier an installed scope filters by right now.
    ///
    /// Under [`ScopeValuePolicy::FirstRegistered`] a non-blank first tenant
    /// that differs from the captured identifier replaces it. Numbers and
    /// numeric strings compare by value, so `"5"` does not replace `5`.
    pub fn scope_value(&self, captured: &Value) -> Value {
        if self.config.scope_value_policy == ScopeValuePolicy::Captured {
            return captured.clone();
        }
        let state = self.state.read();
        match state.tenants.first() {
            Some((_, first)) if !first.is_blank() && !first.loosely_equals(captured) => {
                trace!(captured = %captured, first = %first, "first registered tenant overrides scope value");
                first.clone()
            }
            _ => captured.clone(),
        }
    }

    fn put_tenant(&self, column: String, id: Value) {
        debug!(column = %column, id = %id, "tenant registered");
        self.state.write().tenants.put(column, id);
    }

    fn defer<M: TenantScoped>(state: &mut ManagerState, model: &M, stage: DeferredStage) {
        debug!(entity = %model.entity_name(), stage = ?stage, "no tenant registered, deferring");
        state.deferred.push(DeferredEntity {
            entity: model.entity_name().to_string(),
            key: model.key(),
            stage,
        });
    }

    fn describe(source: &TenantSource) -> String {
        match source {
            TenantSource::Column(name) => name.clone(),
            TenantSource::Record { foreign_key, .. } => foreign_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Model};

    #[derive(Debug, Clone, Default)]
    struct Organization {
        attributes: Attributes,
    }

    impl Model for Organization {
        fn entity_name(&self) -> &str {
            "Organization"
        }

        fn table(&self) -> &str {
            "organizations"
        }

        fn get_attribute(&self, name: &str) -> Option<&Value> {
            self.attributes.get(name)
        }

        fn set_attribute(&mut self, name: &str, value: Value) {
            self.attributes.set(name, value);
        }

        fn attributes(&self) -> Vec<(String, Value)> {
            self.attributes.to_row()
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Task {
        attributes: Attributes,
    }

    impl Model for Task {
        fn entity_name(&self) -> &str {
            "Task"
        }

        fn table(&self) -> &str {
            "tasks"
        }

        fn get_attribute(&self, name: &str) -> Option<&Value> {
            self.attributes.get(name)
        }

        fn set_attribute(&mut self, name: &str, value: Value) {
            self.attributes.set(name, value);
        }

        fn attributes(&self) -> Vec<(String, Value)> {
            self.attributes.to_row()
        }
    }

    impl TenantScoped for Task {
        const TENANT_COLUMNS: &'static [&'static str] = &["tenant1", "tenant2"];
    }

    #[derive(Debug, Clone, Default)]
    struct Unscoped {
        attributes: Attributes,
    }

    impl Model for Unscoped {
        fn entity_name(&self) -> &str {
            "Unscoped"
        }

        fn table(&self) -> &str {
            "unscoped"
        }

        fn get_attribute(&self, name: &str) -> Option<&Value> {
            self.attributes.get(name)
        }

        fn set_attribute(&mut self, name: &str, value: Value) {
            self.attributes.set(name, value);
        }

        fn attributes(&self) -> Vec<(String, Value)> {
            self.attributes.to_row()
        }
    }

    impl TenantScoped for Unscoped {}

    fn organization(id: i64) -> Organization {
        Organization {
            attributes: Attributes::new().with("id", id),
        }
    }

    #[test]
    fn test_add_and_has_tenant() {
        let manager = TenantManager::default();
        manager.add_tenant("org_id", 42i64).unwrap();

        assert!(manager.has_tenant("org_id").unwrap());
        assert!(!manager.has_tenant("team_id").unwrap());
        assert_eq!(manager.get_tenants().get("org_id"), Some(&Value::Int64(42)));
        assert_eq!(manager.tenant_id("org_id").unwrap(), Some(Value::Int64(42)));
    }

    #[test]
    fn test_add_tenant_overwrites() {
        let manager = TenantManager::default();
        manager.add_tenant("org_id", 1i64).unwrap();
        manager.add_tenant("org_id", 2i64).unwrap();

        let tenants = manager.get_tenants();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants.get("org_id"), Some(&Value::Int64(2)));
    }

    #[test]
    fn test_null_identifier_rejected() {
        let manager = TenantManager::default();
        for column in ["org_id", "team_id", ""] {
            let err = manager.add_tenant(column, None::<i64>).unwrap_err();
            assert!(matches!(err, Error::TenantNullIdentifier { .. }));
        }
        assert!(manager.get_tenants().is_empty());
    }

    #[test]
    fn test_unknown_tenant_column() {
        let manager = TenantManager::default();
        assert!(matches!(
            manager.add_tenant("", 1i64),
            Err(Error::UnknownTenantColumn(_))
        ));
        assert!(matches!(
            manager.has_tenant(""),
            Err(Error::UnknownTenantColumn(_))
        ));
    }

    #[test]
    fn test_add_tenant_record() {
        let manager = TenantManager::default();
        let org = organization(5);
        manager.add_tenant_record(&org).unwrap();

        assert!(manager.has_tenant(TenantSource::record(&org)).unwrap());
        assert_eq!(
            manager.get_tenants().get("organization_id"),
            Some(&Value::Int64(5))
        );
    }

    #[test]
    fn test_add_tenant_record_without_key() {
        let manager = TenantManager::default();
        let err = manager.add_tenant_record(&Organization::default()).unwrap_err();
        match err {
            Error::TenantNullIdentifier { column } => assert_eq!(column, "organization_id"),
            other => panic!("Expected TenantNullIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_id_wins_over_record_key() {
        let manager = TenantManager::default();
        manager
            .add_tenant(TenantSource::record(&organization(5)), 8i64)
            .unwrap();
        assert_eq!(
            manager.get_tenants().get("organization_id"),
            Some(&Value::Int64(8))
        );
    }

    #[test]
    fn test_remove_tenant() {
        let manager = TenantManager::default();
        manager.add_tenant("org_id", 1i64).unwrap();

        assert!(manager.remove_tenant("org_id").unwrap());
        assert!(!manager.remove_tenant("org_id").unwrap());
        assert!(!manager.has_tenant("org_id").unwrap());
    }

    #[test]
    fn test_scopes_deferred_without_tenants() {
        let manager = TenantManager::default();
        let scopes = ScopeRegistry::new();

        let outcome = manager.add_tenant_scopes(&Task::default(), &scopes).unwrap();
        assert_eq!(outcome, ScopeInstall::Deferred);
        assert!(scopes.scopes_for("Task").is_empty());

        let deferred = manager.deferred();
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].entity, "Task");
        assert_eq!(deferred[0].stage, DeferredStage::ScopeInstall);
    }

    #[test]
    fn test_scopes_installed_for_applicable_columns() {
        let manager = TenantManager::default();
        let scopes = ScopeRegistry::new();
        manager.add_tenant("tenant2", 9i64).unwrap();
        manager.add_tenant("unrelated", 1i64).unwrap();

        let outcome = manager.add_tenant_scopes(&Task::default(), &scopes).unwrap();
        assert_eq!(outcome, ScopeInstall::Installed(vec!["tenant2".to_string()]));
        assert_eq!(scopes.scope_names("Task"), vec!["tenant2"]);
        assert!(!manager.has_deferred());
    }

    #[test]
    fn test_first_registered_tenant_overrides_scope_value() {
        let manager = TenantManager::default();
        let scopes = ScopeRegistry::new();
        manager.add_tenant("tenant1", 5i64).unwrap();
        manager.add_tenant("tenant2", 9i64).unwrap();
        manager.add_tenant_scopes(&Task::default(), &scopes).unwrap();

        let resolved: Vec<FilterExpr> = scopes
            .scopes_for("Task")
            .iter()
            .map(GlobalScope::resolve)
            .collect();
        assert_eq!(
            resolved,
            vec![
                FilterExpr::eq("tasks.tenant1", 5i64),
                FilterExpr::eq("tasks.tenant2", 5i64),
            ]
        );
    }

    #[test]
    fn test_captured_policy_keeps_install_value() {
        let manager = TenantManager::new(
            TenancyConfig::new().with_scope_value_policy(ScopeValuePolicy::Captured),
        );
        let scopes = ScopeRegistry::new();
        manager.add_tenant("tenant1", 5i64).unwrap();
        manager.add_tenant("tenant2", 9i64).unwrap();
        manager.add_tenant_scopes(&Task::default(), &scopes).unwrap();

        let tenant2 = scopes
            .scopes_for("Task")
            .into_iter()
            .find(|s| s.name() == "tenant2")
            .unwrap();
        assert_eq!(tenant2.resolve(), FilterExpr::eq("tasks.tenant2", 9i64));
    }

    #[test]
    fn test_blank_first_tenant_does_not_override() {
        let manager = TenantManager::default();
        manager.add_tenant("tenant1", 0i64).unwrap();
        assert_eq!(manager.scope_value(&Value::Int64(9)), Value::Int64(9));
    }

    #[test]
    fn test_zero_string_first_tenant_does_not_override() {
        let manager = TenantManager::default();
        manager.add_tenant("tenant1", "0").unwrap();
        assert_eq!(manager.scope_value(&Value::Int64(9)), Value::Int64(9));
    }

    #[test]
    fn test_numeric_string_first_tenant_matches_captured_number() {
        let manager = TenantManager::default();
        let scopes = ScopeRegistry::new();
        manager.add_tenant("tenant1", "5").unwrap();
        manager.add_tenant("tenant2", 5i64).unwrap();
        manager.add_tenant_scopes(&Task::default(), &scopes).unwrap();

        let tenant2 = scopes
            .scopes_for("Task")
            .into_iter()
            .find(|s| s.name() == "tenant2")
            .unwrap();
        assert_eq!(tenant2.resolve(), FilterExpr::eq("tasks.tenant2", 5i64));

        // A different numeric string still overrides.
        manager.add_tenant("tenant1", "7").unwrap();
        assert_eq!(tenant2.resolve(), FilterExpr::eq("tasks.tenant2", "7"));
    }

    #[test]
    fn test_scope_value_reads_live_assignments() {
        let manager = TenantManager::default();
        manager.add_tenant("tenant1", 5i64).unwrap();
        assert_eq!(manager.scope_value(&Value::Int64(5)), Value::Int64(5));

        manager.add_tenant("tenant1", 6i64).unwrap();
        assert_eq!(manager.scope_value(&Value::Int64(5)), Value::Int64(6));
    }

    #[test]
    fn test_new_tenant_model_stamps_applicable_columns() {
        let manager = TenantManager::default();
        manager.add_tenant("tenant1", 5i64).unwrap();

        let mut task = Task::default();
        let stamped = manager.new_tenant_model(&mut task).unwrap();

        assert_eq!(stamped, vec!["tenant1".to_string()]);
        assert_eq!(task.get_attribute("tenant1"), Some(&Value::Int64(5)));
        assert_eq!(task.get_attribute("tenant2"), None);
    }

    #[test]
    fn test_new_tenant_model_keeps_explicit_values() {
        let manager = TenantManager::default();
        manager.add_tenant("tenant1", 5i64).unwrap();

        let mut task = Task {
            attributes: Attributes::new().with("tenant1", 7i64),
        };
        let stamped = manager.new_tenant_model(&mut task).unwrap();

        assert!(stamped.is_empty());
        assert_eq!(task.get_attribute("tenant1"), Some(&Value::Int64(7)));
    }

    #[test]
    fn test_new_tenant_model_stamps_null_attribute() {
        let manager = TenantManager::default();
        manager.add_tenant("tenant1", 5i64).unwrap();

        let mut task = Task {
            attributes: Attributes::new().with("tenant1", Value::Null),
        };
        manager.new_tenant_model(&mut task).unwrap();
        assert_eq!(task.get_attribute("tenant1"), Some(&Value::Int64(5)));
    }

    #[test]
    fn test_new_tenant_model_deferred_without_tenants() {
        let manager = TenantManager::default();
        let mut task = Task::default();

        let stamped = manager.new_tenant_model(&mut task).unwrap();
        assert!(stamped.is_empty());
        assert!(task.attributes().is_empty());
        assert_eq!(manager.deferred()[0].stage, DeferredStage::Creating);
    }

    #[test]
    fn test_undeclared_columns_fail() {
        let manager = TenantManager::default();
        let scopes = ScopeRegistry::new();
        manager.add_tenant("org_id", 1i64).unwrap();

        assert!(matches!(
            manager.add_tenant_scopes(&Unscoped::default(), &scopes),
            Err(Error::TenantColumnsNotDeclared { .. })
        ));
        assert!(matches!(
            manager.new_tenant_model(&mut Unscoped::default()),
            Err(Error::TenantColumnsNotDeclared { .. })
        ));
    }
}
