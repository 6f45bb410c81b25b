//! Activation of tenant-scoped record types.

use std::any::TypeId;

use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::context::TenancyContext;
use crate::error::Result;
use crate::model::TenantScoped;
use crate::tenant::ScopeInstall;

/// How a record type was activated in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    /// The type has not been activated.
    Unregistered,
    /// Tenant scopes were installed (possibly for no column).
    ScopesInstalled,
    /// No tenant was registered at activation; no scope was installed.
    Deferred,
}

/// Opt-in behaviour for tenant-owned record types.
///
/// Activation runs once per type and context: it installs the tenant scopes
/// using a fresh blank instance and registers the `creating` hook that
/// stamps tenant columns. Tenants registered after activation are not
/// picked up by the scopes.
pub trait ScopableEntity: TenantScoped + Default + Sized {
    /// Activate the type in `ctx`. Subsequent calls return the recorded
    /// state without doing anything.
    fn boot(ctx: &TenancyContext) -> Result<BootState> {
        let type_id = TypeId::of::<Self>();
        if let Some(state) = ctx.booted().get(&type_id) {
            return Ok(*state);
        }

        let tenancy = ctx.tenancy()?;
        let blank = Self::default();
        let state = match tenancy.add_tenant_scopes(&blank, ctx.scopes())? {
            ScopeInstall::Installed(_) => BootState::ScopesInstalled,
            ScopeInstall::Deferred => BootState::Deferred,
        };

        match ctx.booted().entry(type_id) {
            Entry::Occupied(existing) => return Ok(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(state);
            }
        }

        let manager = tenancy.clone();
        ctx.events().creating::<Self, _>(move |record| {
            manager.new_tenant_model(record).map(|_| ())
        });

        debug!(entity = %blank.entity_name(), state = ?state, "entity booted");
        Ok(state)
    }
}

impl<T: TenantScoped + Default> ScopableEntity for T {}
