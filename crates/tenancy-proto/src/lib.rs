//! Tenancy protocol types.
//!
//! This crate defines the values and query IR exchanged between the tenant
//! scoping engine (`tenancy-core`) and whatever storage layer executes the
//! queries.
//!
//! # Modules
//!
//! - [`value`] - Runtime values for record attributes and tenant identifiers
//! - [`query`] - Query IR: conjunctive filter lists with scope provenance
//! - [`error`] - Protocol error types

pub mod error;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use query::{Filter, FilterExpr, FilterOrigin, Pagination, Query, SimpleFilter};
pub use value::Value;
