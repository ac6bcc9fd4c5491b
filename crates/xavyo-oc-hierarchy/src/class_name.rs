//! Object class names
//!
//! LDAP object class names are case-insensitive (RFC 4512). A [`ClassName`]
//! keeps the spelling it was created with for display, but compares, orders
//! and hashes on its lowercase canonical form.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Case-insensitive object class identifier.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClassName {
    /// Spelling as supplied by the caller or the schema.
    name: String,
    /// Lowercase form used for every comparison.
    canonical: String,
}

/// Classes known to be ancestors of a given class.
pub type AncestorSet = HashSet<ClassName>;

impl ClassName {
    /// Create a class name, keeping the given spelling for display.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let canonical = name.to_lowercase();
        Self { name, canonical }
    }

    /// The spelling this name was created with.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The lowercase form used as the cache key.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Case-insensitive prefix test.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.canonical.starts_with(&prefix.to_lowercase())
    }
}

impl PartialEq for ClassName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ClassName {}

impl Hash for ClassName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for ClassName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassName({:?})", self.name)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<ClassName> for String {
    fn from(class: ClassName) -> Self {
        class.name
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
