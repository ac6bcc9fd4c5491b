//! Schema source contract
//!
//! The resolver learns the inheritance relation from a [`SchemaQuerier`]. The
//! LDAP implementation lives in `xavyo-connector-ldap`; this module also ships
//! an in-memory implementation for tests and offline schema files.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::class_name::{AncestorSet, ClassName};
use crate::error::{SchemaError, SchemaResult};

/// Which ancestors a schema source reports for a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorScope {
    /// Only the classes named in the definition's `SUP` clause.
    Direct,
    /// The full superclass closure.
    #[default]
    Transitive,
}

impl AncestorScope {
    /// Parse a scope name, case-insensitively.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "transitive" => Some(Self::Transitive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Transitive => "transitive",
        }
    }
}

/// Authoritative source of the class inheritance relation.
#[async_trait]
pub trait SchemaQuerier: Send + Sync {
    /// Look up the ancestor sets of a batch of classes in one round trip.
    ///
    /// Classes unknown to the schema are left out of the returned map. Any
    /// error aborts the whole batch.
    async fn query_superclasses(
        &self,
        classes: &BTreeSet<ClassName>,
    ) -> SchemaResult<HashMap<ClassName, AncestorSet>>;
}

/// Compute ancestor sets for `classes` from a direct-parent map.
///
/// Shared by every schema source that holds a parsed copy of the schema.
/// Cycles in the parent map are tolerated.
pub fn ancestors_from_parents(
    parents: &HashMap<ClassName, Vec<ClassName>>,
    classes: &BTreeSet<ClassName>,
    scope: AncestorScope,
) -> HashMap<ClassName, AncestorSet> {
    let mut result = HashMap::new();

    for class in classes {
        let Some(direct) = parents.get(class) else {
            continue;
        };

        let ancestors = match scope {
            AncestorScope::Direct => direct.iter().cloned().collect(),
            AncestorScope::Transitive => {
                let mut seen = AncestorSet::new();
                let mut pending: Vec<&ClassName> = direct.iter().collect();
                while let Some(next) = pending.pop() {
                    if seen.insert(next.clone()) {
                        if let Some(grand) = parents.get(next) {
                            pending.extend(grand.iter());
                        }
                    }
                }
                seen
            }
        };

        result.insert(class.clone(), ancestors);
    }

    result
}

/// In-memory schema source for testing and offline schema files.
#[derive(Debug, Default)]
pub struct InMemorySchemaQuerier {
    parents: HashMap<ClassName, Vec<ClassName>>,
    scope: AncestorScope,
    failing: AtomicBool,
    calls: AtomicUsize,
    batches: Mutex<Vec<BTreeSet<ClassName>>>,
}

impl InMemorySchemaQuerier {
    /// Create an empty schema reporting transitive ancestors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema from a direct-parent map.
    #[must_use]
    pub fn with_parents(parents: HashMap<ClassName, Vec<ClassName>>) -> Self {
        Self {
            parents,
            ..Self::default()
        }
    }

    /// Declare a class and its direct superclasses.
    #[must_use]
    pub fn with_class(mut self, class: &str, superclasses: &[&str]) -> Self {
        self.parents.insert(
            ClassName::new(class),
            superclasses.iter().map(|s| ClassName::new(*s)).collect(),
        );
        self
    }

    /// Set which ancestors are reported.
    #[must_use]
    pub fn with_scope(mut self, scope: AncestorScope) -> Self {
        self.scope = scope;
        self
    }

    /// Make every subsequent query fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of queries received, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Batches received, in order.
    pub fn batches(&self) -> Vec<BTreeSet<ClassName>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl SchemaQuerier for InMemorySchemaQuerier {
    async fn query_superclasses(
        &self,
        classes: &BTreeSet<ClassName>,
    ) -> SchemaResult<HashMap<ClassName, AncestorSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().push(classes.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(SchemaError::unavailable("in-memory schema set to fail"));
        }

        Ok(ancestors_from_parents(&self.parents, classes, self.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_schema() -> InMemorySchemaQuerier {
        InMemorySchemaQuerier::new()
            .with_class("top", &[])
            .with_class("person", &["top"])
            .with_class("organizationalPerson", &["person"])
            .with_class("inetOrgPerson", &["organizationalPerson"])
    }

    fn batch(names: &[&str]) -> BTreeSet<ClassName> {
        names.iter().map(|n| ClassName::new(*n)).collect()
    }

    #[tokio::test]
    async fn test_transitive_scope_reports_full_chain() {
        let schema = person_schema();
        let result = schema
            .query_superclasses(&batch(&["inetOrgPerson"]))
            .await
            .unwrap();

        let ancestors = &result[&ClassName::new("inetorgperson")];
        assert_eq!(ancestors.len(), 3);
        assert!(ancestors.contains(&ClassName::new("top")));
    }

    #[tokio::test]
    async fn test_direct_scope_reports_sup_only() {
        let schema = person_schema().with_scope(AncestorScope::Direct);
        let result = schema
            .query_superclasses(&batch(&["inetOrgPerson"]))
            .await
            .unwrap();

        let ancestors = &result[&ClassName::new("inetOrgPerson")];
        assert_eq!(ancestors.len(), 1);
        assert!(ancestors.contains(&ClassName::new("organizationalPerson")));
    }

    #[tokio::test]
    async fn test_unknown_classes_are_omitted() {
        let schema = person_schema();
        let result = schema
            .query_superclasses(&batch(&["person", "aaa"]))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(!result.contains_key(&ClassName::new("aaa")));
    }

    #[tokio::test]
    async fn test_failing_mode_and_call_tracking() {
        let schema = person_schema();
        schema.set_failing(true);

        let err = schema
            .query_superclasses(&batch(&["person"]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_UNAVAILABLE");
        assert_eq!(schema.call_count(), 1);
        assert_eq!(schema.batches(), vec![batch(&["person"])]);
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let parents = HashMap::from([
            (ClassName::new("a"), vec![ClassName::new("b")]),
            (ClassName::new("b"), vec![ClassName::new("a")]),
        ]);
        let result = ancestors_from_parents(&parents, &batch(&["a"]), AncestorScope::Transitive);
        let ancestors = &result[&ClassName::new("a")];
        assert!(ancestors.contains(&ClassName::new("a")));
        assert!(ancestors.contains(&ClassName::new("b")));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(AncestorScope::parse_str("Direct"), Some(AncestorScope::Direct));
        assert_eq!(
            AncestorScope::parse_str("transitive"),
            Some(AncestorScope::Transitive)
        );
        assert_eq!(AncestorScope::parse_str("both"), None);
        assert_eq!(AncestorScope::default().as_str(), "transitive");
    }
}
