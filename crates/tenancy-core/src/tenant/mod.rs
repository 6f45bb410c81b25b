//! Tenant registration, scope installation and record stamping.

mod assignments;
mod manager;
mod source;

pub use assignments::TenantAssignments;
pub use manager::{DeferredEntity, DeferredStage, ScopeInstall, TenantManager};
pub use source::TenantSource;
