//! Read query builder.
//!
//! Collects the caller's filters and, at build time, appends the global
//! scopes registered for the entity. Scopes are resolved when `build` runs,
//! so they reflect the tenant state at that moment.

use std::collections::HashSet;

use tenancy_proto::{Filter, FilterExpr, Pagination, Query, Value};
use tracing::trace;

use crate::model::Model;
use crate::scope::ScopeRegistry;

/// Builder for entity read queries.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    entity: String,
    table: String,
    filters: Vec<FilterExpr>,
    pagination: Option<Pagination>,
    excluded_scopes: HashSet<String>,
    without_scopes: bool,
}

impl QueryBuilder {
    /// Start a query for an entity stored in `table`.
    pub fn new(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            table: table.into(),
            filters: Vec::new(),
            pagination: None,
            excluded_scopes: HashSet::new(),
            without_scopes: false,
        }
    }

    /// Start a query for the entity type of `M`.
    pub fn for_model<M: Model + Default>() -> Self {
        let blank = M::default();
        Self::new(blank.entity_name(), blank.table())
    }

    /// Entity being queried.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Add an equality filter.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(FilterExpr::eq(field, value))
    }

    /// Add a filter expression.
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.filters.push(expr);
        self
    }

    /// Limit and offset the results.
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Skip one named global scope.
    pub fn without_global_scope(mut self, name: impl Into<String>) -> Self {
        self.excluded_scopes.insert(name.into());
        self
    }

    /// Skip every global scope.
    pub fn without_global_scopes(mut self) -> Self {
        self.without_scopes = true;
        self
    }

    /// Compile the query, appending the entity's global scopes after the
    /// caller's filters.
    pub fn build(&self, scopes: &ScopeRegistry) -> Query {
        let mut query = Query::new(self.entity.clone(), self.table.clone());
        for expr in &self.filters {
            query = query.with_filter(Filter::new(expr.clone()));
        }

        if !self.without_scopes {
            for scope in scopes.scopes_for(&self.entity) {
                if self.excluded_scopes.contains(scope.name()) {
                    continue;
                }
                let expr = scope.resolve();
                trace!(entity = %self.entity, scope = %scope.name(), filter = ?expr, "applying global scope");
                query = query.with_filter(Filter::scoped(scope.name(), expr));
            }
        }

        if let Some(pagination) = self.pagination {
            query = query.with_pagination(pagination);
        }
        query
    }
}
