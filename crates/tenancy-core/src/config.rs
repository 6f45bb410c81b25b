//! Tenancy configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default name the tenant manager is bound under in a context's container.
pub const DEFAULT_SERVICE_NAME: &str = "Tenancy";

/// Which identifier an installed tenant scope filters by at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeValuePolicy {
    /// The first registered tenant overrides the identifier captured at
    /// install time whenever it is non-blank and differs from it.
    #[default]
    FirstRegistered,
    /// Always filter by the identifier captured at install time.
    Captured,
}

/// Tenancy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// Container name the tenant manager is resolvable under.
    pub service_name: String,

    /// Identifier selection for installed scopes.
    pub scope_value_policy: ScopeValuePolicy,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TenancyConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            scope_value_policy: ScopeValuePolicy::default(),
        }
    }

    /// Set the container service name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the scope value policy.
    pub fn with_scope_value_policy(mut self, policy: ScopeValuePolicy) -> Self {
        self.scope_value_policy = policy;
        self
    }

    /// Load configuration from a JSON document. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "service_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
