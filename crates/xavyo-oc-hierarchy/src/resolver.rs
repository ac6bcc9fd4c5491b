//! Most-specific object class resolution
//!
//! Given candidate classes and a reference class, pick the most derived one
//! using the superclass relation held in a [`SuperclassCache`]. Classes not
//! yet cached are learned from the [`SchemaQuerier`] in a single batch before
//! any comparison runs; comparisons themselves only ever read the cache.
//!
//! # Example
//!
//! ```ignore
//! use xavyo_oc_hierarchy::prelude::*;
//!
//! let resolver = SpecificityResolver::new(querier, Arc::new(SuperclassCache::new()))
//!     .with_internal_prefix("xavyo");
//!
//! let most_specific = resolver
//!     .resolve_most_specific(&["xavyoAccount".into(), "inetOrgPerson".into()], &"person".into())
//!     .await?;
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::SuperclassCache;
use crate::class_name::{AncestorSet, ClassName};
use crate::config::ResolverConfig;
use crate::error::SchemaResult;
use crate::querier::SchemaQuerier;

/// Decides whether a class is an internal extension class.
pub type InternalClassPredicate = Arc<dyn Fn(&ClassName) -> bool + Send + Sync>;

/// Resolves the most specific object class among candidates.
#[derive(Clone)]
pub struct SpecificityResolver {
    querier: Arc<dyn SchemaQuerier>,
    cache: Arc<SuperclassCache>,
    is_internal: InternalClassPredicate,
}

impl SpecificityResolver {
    /// Create a resolver with no internal extension classes.
    pub fn new(querier: Arc<dyn SchemaQuerier>, cache: Arc<SuperclassCache>) -> Self {
        Self {
            querier,
            cache,
            is_internal: Arc::new(|_| false),
        }
    }

    /// Create a resolver from configuration.
    pub fn from_config(
        config: &ResolverConfig,
        querier: Arc<dyn SchemaQuerier>,
        cache: Arc<SuperclassCache>,
    ) -> Self {
        let resolver = Self::new(querier, cache);
        match &config.internal_class_prefix {
            Some(prefix) => resolver.with_internal_prefix(prefix),
            None => resolver,
        }
    }

    /// Treat classes starting with `prefix` (case-insensitive) as internal.
    ///
    /// An empty prefix disables internal class detection.
    #[must_use]
    pub fn with_internal_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().to_lowercase();
        if prefix.is_empty() {
            return self.with_internal_class_predicate(|_| false);
        }
        self.with_internal_class_predicate(move |class| class.has_prefix(&prefix))
    }

    /// Use an arbitrary rule to recognise internal classes.
    #[must_use]
    pub fn with_internal_class_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ClassName) -> bool + Send + Sync + 'static,
    {
        self.is_internal = Arc::new(predicate);
        self
    }

    /// The cache backing this resolver.
    pub fn cache(&self) -> &Arc<SuperclassCache> {
        &self.cache
    }

    /// Whether `class` is an internal extension class.
    pub fn is_internal(&self, class: &ClassName) -> bool {
        (self.is_internal)(class)
    }

    /// Return the most specific class among `candidates` relative to `reference`.
    ///
    /// Candidates are visited in order; each one replaces the running answer
    /// when the running answer is a cached ancestor of it. The reference is
    /// returned when no candidate can be shown to be more specific. The only
    /// failure is a schema query error, returned as is.
    #[instrument(skip(self, candidates, reference), fields(candidates = candidates.len(), reference = %reference))]
    pub async fn resolve_most_specific(
        &self,
        candidates: &[ClassName],
        reference: &ClassName,
    ) -> SchemaResult<ClassName> {
        self.learn_missing(candidates).await?;

        let mut most_specific = reference;
        for candidate in candidates {
            // A shared cache may hold entries for internal classes learned elsewhere.
            if self.is_internal(candidate) {
                continue;
            }
            if self.is_ancestor(candidate, most_specific) {
                most_specific = candidate;
            }
        }

        debug!(result = %most_specific, "Resolved most specific object class");
        Ok(most_specific.clone())
    }

    /// Check whether `ancestor` is a cached ancestor of `class`.
    ///
    /// Walks only cached entries; a class without an entry has no known
    /// ancestors and nothing is queried.
    pub fn is_ancestor(&self, class: &ClassName, ancestor: &ClassName) -> bool {
        let mut visited = HashSet::new();
        self.is_ancestor_inner(class, ancestor, &mut visited)
    }

    fn is_ancestor_inner(
        &self,
        class: &ClassName,
        ancestor: &ClassName,
        visited: &mut HashSet<ClassName>,
    ) -> bool {
        if !visited.insert(class.clone()) {
            return false;
        }

        let Some(supers) = self.cache.lookup(class) else {
            return false;
        };

        if supers.contains(ancestor) {
            return true;
        }

        supers
            .iter()
            .any(|parent| self.is_ancestor_inner(parent, ancestor, visited))
    }

    /// Query the schema once for every uncached, non-internal candidate.
    async fn learn_missing(&self, candidates: &[ClassName]) -> SchemaResult<()> {
        let missing: BTreeSet<ClassName> = candidates
            .iter()
            .filter(|class| !self.is_internal(class) && !self.cache.contains(class))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        debug!(count = missing.len(), "Querying schema for uncached object classes");

        let mut found = self.querier.query_superclasses(&missing).await?;

        // Only requested classes are cached, so existing entries are never
        // overwritten. Unknown classes get an empty entry and are not queried again.
        let additions: HashMap<ClassName, AncestorSet> = missing
            .into_iter()
            .map(|class| {
                let ancestors = found.remove(&class).unwrap_or_default();
                (class, ancestors)
            })
            .collect();

        if !found.is_empty() {
            debug!(count = found.len(), "Ignoring unrequested object classes from schema");
        }

        debug!(count = additions.len(), "Caching object class ancestors");
        self.cache.merge(additions);
        Ok(())
    }
}

impl fmt::Debug for SpecificityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificityResolver")
            .field("cached_classes", &self.cache.len())
            .finish_non_exhaustive()
    }
}
