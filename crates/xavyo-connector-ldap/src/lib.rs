//! # LDAP Schema Source
//!
//! Reads object class inheritance from LDAP directories for
//! `xavyo-oc-hierarchy`.
//!
//! ## Features
//!
//! - LDAP v3 protocol support
//! - SSL/TLS and STARTTLS
//! - Subschema subentry discovery through the root DSE
//! - RFC 4512 object class description parsing (name aliases, OID superiors)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xavyo_connector_ldap::{LdapSchemaConfig, LdapSchemaQuerier};
//! use xavyo_oc_hierarchy::prelude::*;
//!
//! let config = LdapSchemaConfig::new("ldap.example.com")
//!     .with_bind("cn=reader,dc=example,dc=com", "secret")
//!     .with_starttls();
//!
//! let querier = Arc::new(LdapSchemaQuerier::new(config)?);
//! let resolver = SpecificityResolver::new(querier, Arc::new(SuperclassCache::new()));
//! ```

pub mod config;
pub mod querier;
pub mod schema_parser;

// Re-exports
pub use config::LdapSchemaConfig;
pub use querier::LdapSchemaQuerier;
pub use schema_parser::{parse_object_class_definition, ObjectClassDefinition, SuperclassIndex};
