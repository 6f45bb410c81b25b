//! In-memory record store.
//!
//! A reference query layer: inserts fire the context's `creating` hooks and
//! reads go through [`QueryBuilder`], so global scopes apply exactly as they
//! would against a real backend.

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;
use tenancy_proto::Value;
use tracing::{debug, trace};

use crate::context::TenancyContext;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::query::{FilterEvaluator, QueryBuilder};

/// Table of records of one type, held in memory.
#[derive(Debug)]
pub struct MemoryStore<M> {
    records: RwLock<Vec<M>>,
    next_key: AtomicI64,
}

impl<M> Default for MemoryStore<M> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_key: AtomicI64::new(1),
        }
    }
}

impl<M: Model + Clone + Default> MemoryStore<M> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a new record.
    ///
    /// `creating` hooks run first and may abort the insert. A record without
    /// a primary key is assigned the next sequence value; an explicit integer
    /// key moves the sequence past it.
    pub fn insert(&self, ctx: &TenancyContext, mut record: M) -> Result<M> {
        ctx.events().fire_creating(&mut record)?;

        let key = record.key();
        if key.is_null() {
            let key = self.next_key.fetch_add(1, Ordering::SeqCst);
            let key_name = record.key_name().to_string();
            record.set_attribute(&key_name, Value::Int64(key));
        } else if let Some(explicit) = key.as_i64() {
            self.next_key
                .fetch_max(explicit.saturating_add(1), Ordering::SeqCst);
        }

        debug!(entity = %record.entity_name(), key = %record.key(), "record inserted");
        self.records.write().push(record.clone());
        Ok(record)
    }

    /// Start a query for this store's entity type.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::for_model::<M>()
    }

    /// Records visible through `builder` in `ctx`.
    pub fn get(&self, ctx: &TenancyContext, builder: &QueryBuilder) -> Vec<M> {
        let query = builder.build(ctx.scopes());
        trace!(entity = %query.entity, filters = query.filters.len(), "executing query");

        let records = self.records.read();
        let matching = records
            .iter()
            .filter(|record| FilterEvaluator::matches(&query, &record.attributes()));

        match query.pagination {
            Some(p) => matching
                .skip(p.offset as usize)
                .take(p.limit as usize)
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        }
    }

    /// First record visible through `builder`.
    pub fn first(&self, ctx: &TenancyContext, builder: &QueryBuilder) -> Option<M> {
        self.get(ctx, builder).into_iter().next()
    }

    /// Every record visible in `ctx`.
    pub fn all(&self, ctx: &TenancyContext) -> Vec<M> {
        self.get(ctx, &self.query())
    }

    /// Record with the given primary key, if visible in `ctx`.
    pub fn find(&self, ctx: &TenancyContext, key: impl Into<Value>) -> Option<M> {
        let blank = M::default();
        let builder = self.query().where_eq(blank.key_name(), key);
        self.first(ctx, &builder)
    }

    /// Record with the given primary key, failing when the current tenant
    /// cannot see it.
    pub fn find_or_fail(&self, ctx: &TenancyContext, key: impl Into<Value>) -> Result<M> {
        let key = key.into();
        self.find(ctx, key.clone())
            .ok_or_else(|| Error::RecordNotFoundForTenant {
                entity: M::default().entity_name().to_string(),
                key,
            })
    }

    /// Number of stored records, ignoring scopes.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
