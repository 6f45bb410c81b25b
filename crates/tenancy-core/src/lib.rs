//! Tenancy Core - tenant scoping for an ORM query layer.
//!
//! A [`TenancyContext`] holds the tenants active for one unit of work. Record
//! types that implement [`TenantScoped`] are activated with
//! [`ScopableEntity::boot`]: every read query built for them then carries a
//! filter per tenant column, and new records get their tenant columns
//! stamped before insert.
//!
//! ```
//! use tenancy_core::{Attributes, Model, TenantScoped, ScopableEntity, MemoryStore, TenancyContext};
//! use tenancy_core::proto::Value;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Invoice {
//!     attributes: Attributes,
//! }
//!
//! impl Model for Invoice {
//!     fn entity_name(&self) -> &str { "Invoice" }
//!     fn table(&self) -> &str { "invoices" }
//!     fn get_attribute(&self, name: &str) -> Option<&Value> { self.attributes.get(name) }
//!     fn set_attribute(&mut self, name: &str, value: Value) { self.attributes.set(name, value) }
//!     fn attributes(&self) -> Vec<(String, Value)> { self.attributes.to_row() }
//! }
//!
//! impl TenantScoped for Invoice {
//!     const TENANT_COLUMNS: &'static [&'static str] = &["org_id"];
//! }
//!
//! let ctx = TenancyContext::new();
//! ctx.tenancy()?.add_tenant("org_id", 42i64)?;
//! Invoice::boot(&ctx)?;
//!
//! let store = MemoryStore::<Invoice>::new();
//! let saved = store.insert(&ctx, Invoice::default())?;
//! assert_eq!(saved.get_attribute("org_id"), Some(&Value::Int64(42)));
//! # Ok::<(), tenancy_core::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`tenant`] - Tenant registration, scope installation and stamping
//! - [`scope`] - Named global scopes per entity type
//! - [`query`] - Query building and in-memory filter evaluation
//! - [`context`] - Per-unit-of-work state
//! - [`store`] - In-memory reference store

pub mod config;
pub mod container;
pub mod context;
pub mod entity;
pub mod error;
pub mod events;
pub mod model;
pub mod query;
pub mod scope;
pub mod store;
pub mod tenant;

pub use tenancy_proto as proto;

pub use config::{ScopeValuePolicy, TenancyConfig, DEFAULT_SERVICE_NAME};
pub use container::ServiceContainer;
pub use context::TenancyContext;
pub use entity::{BootState, ScopableEntity};
pub use error::{Error, Result};
pub use events::{CreatingHook, ModelEvents};
pub use model::{snake_case, Attributes, Model, TenantScoped};
pub use query::{FilterEvaluator, QueryBuilder};
pub use scope::{GlobalScope, ScopeRegistry};
pub use store::MemoryStore;
pub use tenant::{
    DeferredEntity, DeferredStage, ScopeInstall, TenantAssignments, TenantManager, TenantSource,
};
