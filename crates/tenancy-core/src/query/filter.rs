//! Filter evaluation against in-memory rows.
//!
//! Field names may be bare (`org_id`) or qualified with the table the row
//! belongs to (`invoices.org_id`). Any other dotted name (`meta.org_id`) is
//! looked up as written, so document-style paths stored as row fields match.

use std::cmp::Ordering;

use tenancy_proto::{FilterExpr, Query, SimpleFilter, Value};

/// Evaluates filter expressions against record rows.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Check that a row satisfies every filter of a query.
    pub fn matches(query: &Query, row: &[(String, Value)]) -> bool {
        query
            .filters
            .iter()
            .all(|filter| Self::evaluate(&filter.expression, &query.table, row))
    }

    /// Evaluate a filter expression against a row of `table`.
    pub fn evaluate(filter: &FilterExpr, table: &str, row: &[(String, Value)]) -> bool {
        match filter {
            FilterExpr::Eq { field, value } => {
                Self::compare_field(row, table, field, |fv| fv.loosely_equals(value))
            }
            FilterExpr::Ne { field, value } => {
                Self::compare_field(row, table, field, |fv| !fv.loosely_equals(value))
            }
            FilterExpr::Lt { field, value } => Self::compare_field(row, table, field, |fv| {
                Self::compare_values(fv, value).is_some_and(Ordering::is_lt)
            }),
            FilterExpr::Gt { field, value } => Self::compare_field(row, table, field, |fv| {
                Self::compare_values(fv, value).is_some_and(Ordering::is_gt)
            }),
            FilterExpr::In { field, values } => Self::compare_field(row, table, field, |fv| {
                values.iter().any(|v| fv.loosely_equals(v))
            }),
            FilterExpr::IsNull { field } => Self::is_null(row, table, field),
            FilterExpr::IsNotNull { field } => !Self::is_null(row, table, field),
            FilterExpr::And(filters) => filters
                .iter()
                .all(|f| Self::evaluate_simple(f, table, row)),
            FilterExpr::Or(filters) => filters
                .iter()
                .any(|f| Self::evaluate_simple(f, table, row)),
        }
    }

    fn evaluate_simple(filter: &SimpleFilter, table: &str, row: &[(String, Value)]) -> bool {
        match filter {
            SimpleFilter::Eq { field, value } => {
                Self::compare_field(row, table, field, |fv| fv.loosely_equals(value))
            }
            SimpleFilter::Ne { field, value } => {
                Self::compare_field(row, table, field, |fv| !fv.loosely_equals(value))
            }
            SimpleFilter::Lt { field, value } => Self::compare_field(row, table, field, |fv| {
                Self::compare_values(fv, value).is_some_and(Ordering::is_lt)
            }),
            SimpleFilter::Gt { field, value } => Self::compare_field(row, table, field, |fv| {
                Self::compare_values(fv, value).is_some_and(Ordering::is_gt)
            }),
            SimpleFilter::In { field, values } => Self::compare_field(row, table, field, |fv| {
                values.iter().any(|v| fv.loosely_equals(v))
            }),
            SimpleFilter::IsNull { field } => Self::is_null(row, table, field),
            SimpleFilter::IsNotNull { field } => !Self::is_null(row, table, field),
        }
    }

    /// Get a field value from a row, resolving a table qualifier.
    fn get_field_value<'a>(
        row: &'a [(String, Value)],
        table: &str,
        field: &str,
    ) -> Option<&'a Value> {
        let lookup = move |column: &str| row.iter().find(|(name, _)| name == column).map(|(_, v)| v);
        match field.split_once('.') {
            Some((qualifier, column)) if qualifier == table => {
                lookup(column).or_else(|| lookup(field))
            }
            _ => lookup(field),
        }
    }

    fn is_null(row: &[(String, Value)], table: &str, field: &str) -> bool {
        matches!(
            Self::get_field_value(row, table, field),
            None | Some(Value::Null)
        )
    }

    /// Missing or null fields never satisfy a comparison.
    fn compare_field<F>(row: &[(String, Value)], table: &str, field: &str, comparator: F) -> bool
    where
        F: FnOnce(&Value) -> bool,
    {
        match Self::get_field_value(row, table, field) {
            Some(Value::Null) | None => false,
            Some(fv) => comparator(fv),
        }
    }

    fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int64(b)) => Some((*a as i64).cmp(b)),
            (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&(*b as i64))),
            (Value::Float32(a), Value::Float32(b)) => a.partial_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
            (Value::Float32(a), Value::Float64(b)) => (*a as f64).partial_cmp(b),
            (Value::Float64(a), Value::Float32(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}
