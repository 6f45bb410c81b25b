//! Query building and in-memory evaluation.

mod builder;
mod filter;

pub use builder::QueryBuilder;
pub use filter::FilterEvaluator;
