//! Core error types.

use tenancy_proto::Value;
use thiserror::Error;

/// Tenancy errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A tenant was registered without an identifier.
    #[error("tenant identifier for '{column}' must not be null")]
    TenantNullIdentifier {
        /// Tenant column the registration targeted.
        column: String,
    },

    /// No tenant column could be derived from the given source.
    #[error("unknown tenant column: {0}")]
    UnknownTenantColumn(String),

    /// The entity type opted into scoping without declaring its tenant columns.
    #[error("tenant columns not declared on entity '{entity}'")]
    TenantColumnsNotDeclared {
        /// Entity type missing the declaration.
        entity: String,
    },

    /// A record lookup found nothing visible to the current tenant.
    #[error("{entity} with key {key} not found for the current tenant")]
    RecordNotFoundForTenant {
        /// Entity type that was queried.
        entity: String,
        /// Primary key that was requested.
        key: Value,
    },

    /// Nothing is bound under the requested service name.
    #[error("service not bound: {0}")]
    ServiceNotBound(String),

    /// The bound service has a different type than requested.
    #[error("service '{0}' is bound to a different type")]
    ServiceTypeMismatch(String),

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A lifecycle hook rejected the operation.
    #[error("hook failed: {0}")]
    Hook(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] tenancy_proto::Error),
}

/// Result type for tenancy operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TenantNullIdentifier {
            column: "org_id".to_string(),
        };
        assert!(err.to_string().contains("org_id"));

        let err = Error::TenantColumnsNotDeclared {
            entity: "Invoice".to_string(),
        };
        assert!(err.to_string().contains("Invoice"));

        let err = Error::RecordNotFoundForTenant {
            entity: "Invoice".to_string(),
            key: Value::Int64(7),
        };
        assert_eq!(
            err.to_string(),
            "Invoice with key 7 not found for the current tenant"
        );
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: Error = tenancy_proto::Error::UnsupportedValue("object".into()).into();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
