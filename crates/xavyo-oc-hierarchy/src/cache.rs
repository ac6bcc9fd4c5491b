//! Superclass cache
//!
//! Process-lifetime store of the class -> ancestors relation learned from the
//! schema source. Entries are added lazily and never evicted; a schema change
//! on the directory is not picked up until the cache is rebuilt.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::class_name::{AncestorSet, ClassName};

/// Concurrent class -> ancestor set store.
///
/// A single mutex guards the whole map: reads and merges are rare compared to
/// normal request traffic and a merge must never be partially visible.
#[derive(Debug, Default)]
pub struct SuperclassCache {
    entries: Mutex<HashMap<ClassName, Arc<AncestorSet>>>,
}

impl SuperclassCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached ancestor set of a class, if it was ever populated.
    pub fn lookup(&self, class: &ClassName) -> Option<Arc<AncestorSet>> {
        self.entries.lock().get(class).cloned()
    }

    /// Insert all given entries under one lock acquisition.
    ///
    /// An existing entry is kept; the first value stored for a class wins.
    pub fn merge(&self, additions: HashMap<ClassName, AncestorSet>) {
        let mut entries = self.entries.lock();
        for (class, ancestors) in additions {
            entries.entry(class).or_insert_with(|| Arc::new(ancestors));
        }
    }

    /// Check whether a class has an entry.
    pub fn contains(&self, class: &ClassName) -> bool {
        self.entries.lock().contains_key(class)
    }

    /// Number of cached classes.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ancestors(names: &[&str]) -> AncestorSet {
        names.iter().map(|n| ClassName::new(*n)).collect()
    }

    #[test]
    fn test_lookup_absent() {
        let cache = SuperclassCache::new();
        assert!(cache.lookup(&ClassName::new("person")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_merge_then_lookup_is_case_insensitive() {
        let cache = SuperclassCache::new();
        cache.merge(HashMap::from([(
            ClassName::new("organizationalPerson"),
            ancestors(&["person", "top"]),
        )]));

        let found = cache
            .lookup(&ClassName::new("ORGANIZATIONALPERSON"))
            .expect("entry should be cached");
        assert!(found.contains(&ClassName::new("person")));
        assert!(found.contains(&ClassName::new("top")));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&ClassName::new("organizationalperson")));
    }

    #[test]
    fn test_merge_empty_ancestor_set_is_an_entry() {
        let cache = SuperclassCache::new();
        cache.merge(HashMap::from([(ClassName::new("aaa"), AncestorSet::new())]));

        let found = cache.lookup(&ClassName::new("aaa")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_merge_keeps_existing_entry() {
        let cache = SuperclassCache::new();
        cache.merge(HashMap::from([(
            ClassName::new("inetOrgPerson"),
            ancestors(&["organizationalPerson"]),
        )]));
        cache.merge(HashMap::from([
            (ClassName::new("INETORGPERSON"), AncestorSet::new()),
            (ClassName::new("person"), ancestors(&["top"])),
        ]));

        let found = cache.lookup(&ClassName::new("inetOrgPerson")).unwrap();
        assert_eq!(*found, ancestors(&["organizationalPerson"]));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_merges_are_all_visible() {
        let cache = Arc::new(SuperclassCache::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        cache.merge(HashMap::from([(
                            ClassName::new(format!("class{i}x{j}")),
                            ancestors(&["top"]),
                        )]));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 400);
    }
}
