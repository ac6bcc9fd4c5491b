//! LDAP schema querier
//!
//! Implements [`SchemaQuerier`] by reading the directory's subschema subentry
//! (RFC 4512 section 4.2) and deriving ancestor sets from its `objectClasses`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use xavyo_oc_hierarchy::{AncestorSet, ClassName, SchemaError, SchemaQuerier, SchemaResult};

use crate::config::LdapSchemaConfig;
use crate::schema_parser::SuperclassIndex;

/// LDAP result code for invalid credentials.
const LDAP_INVALID_CREDENTIALS: u32 = 49;

/// Subschema DN used when the root DSE does not advertise one.
const DEFAULT_SCHEMA_DN: &str = "cn=schema";

/// Reads object class inheritance from an LDAP directory.
pub struct LdapSchemaQuerier {
    /// Configuration.
    config: LdapSchemaConfig,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapSchemaQuerier {
    /// Create a new querier with the given configuration.
    pub fn new(config: LdapSchemaConfig) -> SchemaResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &LdapSchemaConfig {
        &self.config
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn get_connection(&self) -> SchemaResult<Ldap> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = Some(conn.clone());
        }

        Ok(conn)
    }

    /// Create a new LDAP connection and bind.
    async fn create_connection(&self) -> SchemaResult<Ldap> {
        let url = self.config.url();

        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection_timeout())
            .set_starttls(self.config.use_starttls)
            .set_no_tls_verify(!self.config.verify_certificate);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                SchemaError::connection_failed_with_source(
                    format!("Failed to connect to LDAP server at {}", url),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap
            .with_timeout(self.config.connection_timeout())
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| self.map_ldap_error(format!("LDAP bind failed for '{}'", bind_dn), e))?;

        if result.rc != 0 {
            if result.rc == LDAP_INVALID_CREDENTIALS {
                return Err(SchemaError::AuthenticationFailed);
            }
            return Err(SchemaError::connection_failed(format!(
                "LDAP bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "LDAP connection established successfully");

        Ok(ldap)
    }

    /// Drop the cached connection so the next query reconnects.
    async fn reset_connection(&self) {
        self.connection.write().await.take();
    }

    fn map_ldap_error(&self, message: String, err: LdapError) -> SchemaError {
        match err {
            LdapError::Timeout { .. } => SchemaError::ConnectionTimeout {
                timeout_secs: self.config.operation_timeout_secs,
            },
            other => SchemaError::connection_failed_with_source(message, other),
        }
    }

    /// Find the subschema subentry DN.
    async fn schema_dn(&self, ldap: &mut Ldap) -> SchemaResult<String> {
        if let Some(dn) = &self.config.schema_dn {
            return Ok(dn.clone());
        }

        let result = ldap
            .with_timeout(self.config.operation_timeout())
            .search("", Scope::Base, "(objectClass=*)", vec!["subschemaSubentry"])
            .await
            .map_err(|e| self.map_ldap_error("Failed to read root DSE".to_string(), e))?;

        let (entries, _) = result.success().map_err(|e| {
            SchemaError::unavailable_with_source("Root DSE search failed", e)
        })?;

        let subschema_dn = entries.into_iter().next().and_then(|e| {
            let entry = SearchEntry::construct(e);
            attribute_values(&entry, "subschemaSubentry").and_then(|v| v.first().cloned())
        });

        Ok(subschema_dn.unwrap_or_else(|| {
            debug!("Root DSE has no subschemaSubentry, using default");
            DEFAULT_SCHEMA_DN.to_string()
        }))
    }

    /// Read and index every object class definition of the directory.
    #[instrument(skip(self))]
    pub async fn read_superclass_index(&self) -> SchemaResult<SuperclassIndex> {
        let mut ldap = self.get_connection().await?;

        let outcome = self.read_index_with(&mut ldap).await;
        if let Err(ref e) = outcome {
            if e.is_transient() {
                self.reset_connection().await;
            }
        }
        outcome
    }

    async fn read_index_with(&self, ldap: &mut Ldap) -> SchemaResult<SuperclassIndex> {
        let schema_dn = self.schema_dn(ldap).await?;

        let result = ldap
            .with_timeout(self.config.operation_timeout())
            .search(
                &schema_dn,
                Scope::Base,
                "(objectClass=subschema)",
                vec!["objectClasses"],
            )
            .await
            .map_err(|e| self.map_ldap_error(format!("Failed to read schema '{}'", schema_dn), e))?;

        let (entries, _) = result
            .success()
            .map_err(|e| SchemaError::unavailable_with_source("Schema search failed", e))?;

        let schema_entry = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .ok_or_else(|| {
                SchemaError::unavailable(format!("Schema entry '{}' not found", schema_dn))
            })?;

        let definitions = attribute_values(&schema_entry, "objectClasses").ok_or_else(|| {
            SchemaError::unavailable(format!(
                "Schema entry '{}' has no objectClasses attribute",
                schema_dn
            ))
        })?;

        let index = SuperclassIndex::from_definitions(definitions);

        info!(
            schema_dn = %schema_dn,
            object_class_count = index.len(),
            "Object class definitions loaded"
        );

        Ok(index)
    }

    /// Unbind and drop the connection.
    pub async fn dispose(&self) -> SchemaResult<()> {
        let mut conn_guard = self.connection.write().await;
        if let Some(mut ldap) = conn_guard.take() {
            if let Err(e) = ldap.unbind().await {
                warn!(error = %e, "Error during LDAP unbind");
            }
        }

        info!("LDAP schema querier disposed");
        Ok(())
    }
}

/// Case-insensitive attribute lookup; servers differ in the casing they return.
fn attribute_values<'a>(entry: &'a SearchEntry, attribute: &str) -> Option<&'a Vec<String>> {
    entry.attrs.get(attribute).or_else(|| {
        entry
            .attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, values)| values)
    })
}

#[async_trait]
impl SchemaQuerier for LdapSchemaQuerier {
    #[instrument(skip(self, classes), fields(count = classes.len()))]
    async fn query_superclasses(
        &self,
        classes: &BTreeSet<ClassName>,
    ) -> SchemaResult<HashMap<ClassName, AncestorSet>> {
        let index = self.read_superclass_index().await?;
        let ancestors = index.ancestors(classes, self.config.ancestor_scope);

        debug!(
            requested = classes.len(),
            found = ancestors.len(),
            scope = self.config.ancestor_scope.as_str(),
            "Resolved object class ancestors"
        );

        Ok(ancestors)
    }
}

impl std::fmt::Debug for LdapSchemaQuerier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSchemaQuerier")
            .field("config", &self.config.redacted())
            .finish()
    }
}
