//! # Object Class Hierarchy
//!
//! Most-specific object class resolution for xavyo directory provisioning.
//!
//! When an entry carries several object classes, provisioning needs the most
//! derived one. This crate learns the superclass relation lazily from a schema
//! source, keeps it in a process-lifetime cache, and answers specificity
//! questions from that cache.
//!
//! ## Architecture
//!
//! - [`SuperclassCache`] - Shared class -> ancestors store behind one lock
//! - [`SchemaQuerier`] - Schema source contract (LDAP lives in `xavyo-connector-ldap`)
//! - [`SpecificityResolver`] - Batched lookup plus the ancestry walk
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xavyo_oc_hierarchy::prelude::*;
//!
//! let schema = InMemorySchemaQuerier::new()
//!     .with_class("person", &["top"])
//!     .with_class("organizationalPerson", &["person"]);
//! let resolver = SpecificityResolver::new(Arc::new(schema), Arc::new(SuperclassCache::new()));
//!
//! let class = resolver
//!     .resolve_most_specific(&["organizationalPerson".into()], &"person".into())
//!     .await?;
//! assert_eq!(class.as_str(), "organizationalPerson");
//! ```

pub mod cache;
pub mod class_name;
pub mod config;
pub mod error;
pub mod querier;
pub mod resolver;

pub use cache::SuperclassCache;
pub use class_name::{AncestorSet, ClassName};
pub use config::{ConfigError, ResolverConfig};
pub use error::{SchemaError, SchemaResult};
pub use querier::{ancestors_from_parents, AncestorScope, InMemorySchemaQuerier, SchemaQuerier};
pub use resolver::{InternalClassPredicate, SpecificityResolver};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cache::SuperclassCache;
    pub use crate::class_name::{AncestorSet, ClassName};
    pub use crate::config::ResolverConfig;
    pub use crate::error::{SchemaError, SchemaResult};
    pub use crate::querier::{AncestorScope, InMemorySchemaQuerier, SchemaQuerier};
    pub use crate::resolver::SpecificityResolver;
}

// Re-export async_trait for schema source implementors
pub use async_trait::async_trait;
