//! Ordered tenant assignments.

use serde::{Deserialize, Serialize};
use tenancy_proto::Value;

/// Ordered `tenant column → identifier` mapping.
///
/// Keys are unique. Re-assigning a column keeps its original position, so
/// the first registered tenant stays first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantAssignments {
    entries: Vec<(String, Value)>,
}

impl TenantAssignments {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an identifier to a column, overwriting any previous one.
    pub fn put(&mut self, column: impl Into<String>, id: Value) {
        let column = column.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = id,
            None => self.entries.push((column, id)),
        }
    }

    /// Identifier assigned to a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, id)| id)
    }

    /// Check whether a column has an assignment.
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Remove a column's assignment, returning the identifier it had.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(index).1)
    }

    /// The first registered assignment.
    pub fn first(&self) -> Option<(&str, &Value)> {
        self.entries.first().map(|(c, id)| (c.as_str(), id))
    }

    /// Assignments restricted to the given columns, in assignment order.
    pub fn only(&self, columns: &[&str]) -> Vec<(String, Value)> {
        self.entries
            .iter()
            .filter(|(c, _)| columns.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    /// Iterate over assignments in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, id)| (c.as_str(), id))
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no tenant is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_overwrites_in_place() {
        let mut tenants = TenantAssignments::new();
        tenants.put("tenant1", Value::Int64(5));
        tenants.put("tenant2", Value::Int64(9));
        tenants.put("tenant1", Value::Int64(6));

        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants.first(), Some(("tenant1", &Value::Int64(6))));
        assert_eq!(tenants.get("tenant2"), Some(&Value::Int64(9)));
    }

    #[test]
    fn test_only_keeps_assignment_order() {
        let mut tenants = TenantAssignments::new();
        tenants.put("team_id", Value::Int64(3));
        tenants.put("org_id", Value::Int64(1));
        tenants.put("region", Value::String("eu".into()));

        let applicable = tenants.only(&["org_id", "team_id", "project_id"]);
        assert_eq!(
            applicable,
            vec![
                ("team_id".to_string(), Value::Int64(3)),
                ("org_id".to_string(), Value::Int64(1)),
            ]
        );
    }

    #[test]
    fn test_remove() {
        let mut tenants = TenantAssignments::new();
        tenants.put("org_id", Value::Int64(1));

        assert_eq!(tenants.remove("org_id"), Some(Value::Int64(1)));
        assert_eq!(tenants.remove("org_id"), None);
        assert!(tenants.is_empty());
        assert_eq!(tenants.first(), None);
    }
}
