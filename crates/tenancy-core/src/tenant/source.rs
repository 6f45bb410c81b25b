//! Where a tenant column name (and possibly an identifier) comes from.

use tenancy_proto::Value;

use crate::error::{Error, Result};
use crate::model::Model;

/// The column-or-record argument accepted by tenant registration and lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantSource {
    /// A raw tenant column name.
    Column(String),
    /// A tenant record: the column is its foreign key name and the
    /// identifier its primary key.
    Record {
        /// Foreign key name derived from the record type.
        foreign_key: String,
        /// Primary key value of the record.
        key: Value,
    },
}

impl TenantSource {
    /// Source from a raw column name.
    pub fn column(name: impl Into<String>) -> Self {
        TenantSource::Column(name.into())
    }

    /// Source from a tenant record.
    pub fn record<M: Model>(record: &M) -> Self {
        TenantSource::Record {
            foreign_key: record.foreign_key(),
            key: record.key(),
        }
    }

    /// The tenant column this source addresses.
    pub fn tenant_key(&self) -> Result<&str> {
        let key = match self {
            TenantSource::Column(name) => name.as_str(),
            TenantSource::Record { foreign_key, .. } => foreign_key.as_str(),
        };
        if key.trim().is_empty() {
            return Err(Error::UnknownTenantColumn(format!(
                "cannot derive a tenant column from {:?}",
                self
            )));
        }
        Ok(key)
    }

    /// The identifier implied by a record source.
    pub fn implied_id(&self) -> Option<&Value> {
        match self {
            TenantSource::Column(_) => None,
            TenantSource::Record { key, .. } => Some(key),
        }
    }
}

impl From<&str> for TenantSource {
    fn from(name: &str) -> Self {
        TenantSource::Column(name.to_string())
    }
}

impl From<String> for TenantSource {
    fn from(name: String) -> Self {
        TenantSource::Column(name)
    }
}

impl From<&String> for TenantSource {
    fn from(name: &String) -> Self {
        TenantSource::Column(name.clone())
    }
}
