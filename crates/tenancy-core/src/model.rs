//! Record capabilities consumed by the tenancy engine.
//!
//! The engine never owns records. It reads and writes them through [`Model`],
//! and learns which columns make a type tenant-owned through [`TenantScoped`].

use serde::{Deserialize, Serialize};
use tenancy_proto::Value;

use crate::error::{Error, Result};

/// A persistable record as seen by the tenancy layer.
pub trait Model: Send + Sync + 'static {
    /// Entity type name, e.g. `"Organization"`.
    fn entity_name(&self) -> &str;

    /// Storage location (table or collection) of the entity.
    fn table(&self) -> &str;

    /// Name of the primary key attribute.
    fn key_name(&self) -> &str {
        "id"
    }

    /// Primary key value, `Value::Null` while unsaved.
    fn key(&self) -> Value {
        self.get_attribute(self.key_name())
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Name other entities use to reference this one, e.g. `organization_id`.
    fn foreign_key(&self) -> String {
        format!("{}_{}", snake_case(self.entity_name()), self.key_name())
    }

    /// Read an attribute.
    fn get_attribute(&self, name: &str) -> Option<&Value>;

    /// Write an attribute.
    fn set_attribute(&mut self, name: &str, value: Value);

    /// All attributes as a row, in a stable order.
    fn attributes(&self) -> Vec<(String, Value)>;
}

/// A record type owned by one or more tenants.
pub trait TenantScoped: Model {
    /// Columns that identify the owning tenant(s), in declaration order.
    ///
    /// Type-level: an empty list means the type never declared any, and
    /// every scoping operation on it fails.
    const TENANT_COLUMNS: &'static [&'static str] = &[];

    /// The declared tenant columns.
    fn get_tenant_columns(&self) -> Result<&'static [&'static str]> {
        if Self::TENANT_COLUMNS.is_empty() {
            return Err(Error::TenantColumnsNotDeclared {
                entity: self.entity_name().to_string(),
            });
        }
        Ok(Self::TENANT_COLUMNS)
    }

    /// Filter target for a tenant column, `<table>.<column>` by default.
    ///
    /// Document stores that address fields without a table prefix override
    /// this to return the bare column or a dotted path (`meta.org_id`); a
    /// path whose first segment is not the table is matched as written.
    fn qualified_tenant(&self, column: &str) -> String {
        format!("{}.{}", self.table(), column)
    }
}

/// Ordered attribute storage for record types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    /// Create empty attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style set.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Check whether the attribute holds a non-null value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// Copy out as a row.
    pub fn to_row(&self) -> Vec<(String, Value)> {
        self.entries.clone()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Convert a type name to snake case: `OrganizationUnit` → `organization_unit`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower_or_digit = false;
        } else if ch == '-' || ch == ' ' {
            out.push('_');
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}
