//! LDAP schema source configuration
//!
//! Connection and bind settings for reading the directory's subschema entry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use xavyo_oc_hierarchy::config::ConfigError;
use xavyo_oc_hierarchy::{AncestorScope, SchemaError, SchemaResult};

/// Configuration for the LDAP schema querier.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapSchemaConfig {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Verify the server certificate when TLS is in use.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,

    /// Bind DN. Empty means an anonymous bind.
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Subschema entry DN. Discovered from the root DSE when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_dn: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Timeout for each schema search in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Whether ancestor sets carry direct superclasses or the full chain.
    #[serde(default)]
    pub ancestor_scope: AncestorScope,
}

impl std::fmt::Debug for LdapSchemaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSchemaConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("verify_certificate", &self.verify_certificate)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("schema_dn", &self.schema_dn)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .field("ancestor_scope", &self.ancestor_scope)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_true() -> bool {
    true
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_operation_timeout() -> u64 {
    60
}

impl LdapSchemaConfig {
    /// Create a new config for an anonymous bind.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            verify_certificate: true,
            bind_dn: String::new(),
            bind_password: None,
            schema_dn: None,
            connection_timeout_secs: default_connection_timeout(),
            operation_timeout_secs: default_operation_timeout(),
            ancestor_scope: AncestorScope::default(),
        }
    }

    /// Bind with the given DN and password.
    pub fn with_bind(mut self, bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = bind_dn.into();
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Read the schema from a fixed subschema entry.
    pub fn with_schema_dn(mut self, schema_dn: impl Into<String>) -> Self {
        self.schema_dn = Some(schema_dn.into());
        self
    }

    /// Set which ancestors are reported.
    #[must_use]
    pub fn with_ancestor_scope(mut self, scope: AncestorScope) -> Self {
        self.ancestor_scope = scope;
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Connection timeout as Duration.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Schema search timeout as Duration.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SchemaResult<()> {
        if self.host.is_empty() {
            return Err(SchemaError::invalid_configuration("host is required"));
        }

        if self.use_ssl && self.use_starttls {
            return Err(SchemaError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }

        if self.bind_dn.is_empty() && self.bind_password.is_some() {
            return Err(SchemaError::invalid_configuration(
                "bind_password is set but bind_dn is empty",
            ));
        }

        if self.connection_timeout_secs == 0 || self.operation_timeout_secs == 0 {
            return Err(SchemaError::invalid_configuration(
                "timeouts must be greater than zero",
            ));
        }

        if (self.use_ssl || self.use_starttls) && !self.verify_certificate {
            tracing::warn!(
                target: "security",
                host = %self.host,
                "TLS certificate verification is DISABLED for the schema source"
            );
        }

        Ok(())
    }

    /// Create a redacted version of this config (for logging/display).
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = reader("LDAP_HOST").map_err(|_| ConfigError::MissingVar("LDAP_HOST".into()))?;

        let use_ssl = parse_bool(&reader, "LDAP_USE_SSL", false)?;
        let use_starttls = parse_bool(&reader, "LDAP_USE_STARTTLS", false)?;
        let verify_certificate = parse_bool(&reader, "LDAP_VERIFY_CERTIFICATE", true)?;

        let port = match reader("LDAP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("LDAP_PORT".into(), e.to_string()))?,
            Err(_) if use_ssl => 636,
            Err(_) => default_ldap_port(),
        };

        let connection_timeout_secs = parse_u64(
            &reader,
            "LDAP_CONNECT_TIMEOUT_SECS",
            default_connection_timeout(),
        )?;
        let operation_timeout_secs = parse_u64(
            &reader,
            "LDAP_OPERATION_TIMEOUT_SECS",
            default_operation_timeout(),
        )?;

        let ancestor_scope = match reader("LDAP_ANCESTOR_SCOPE") {
            Ok(value) => AncestorScope::parse_str(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "LDAP_ANCESTOR_SCOPE".into(),
                    format!("expected 'direct' or 'transitive', got '{value}'"),
                )
            })?,
            Err(_) => AncestorScope::default(),
        };

        Ok(Self {
            host,
            port,
            use_ssl,
            use_starttls,
            verify_certificate,
            bind_dn: reader("LDAP_BIND_DN").unwrap_or_default(),
            bind_password: reader("LDAP_BIND_PASSWORD").ok(),
            schema_dn: reader("LDAP_SCHEMA_DN").ok().filter(|dn| !dn.is_empty()),
            connection_timeout_secs,
            operation_timeout_secs,
            ancestor_scope,
        })
    }
}

fn parse_bool<F>(reader: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match reader(key) {
        Ok(value) => value
            .parse::<bool>()
            .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_u64<F>(reader: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match reader(key) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    /// Create a reader closure from a HashMap (no global env mutation).
    fn make_reader(vars: HashMap<&str, &str>) -> impl Fn(&str) -> Result<String, VarError> {
        let owned: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| owned.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_missing_host() {
        let err = LdapSchemaConfig::from_reader(make_reader(HashMap::new())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
        assert!(err.to_string().contains("LDAP_HOST"));
    }

    #[test]
    fn test_defaults() {
        let reader = make_reader(HashMap::from([("LDAP_HOST", "ldap.example.com")]));
        let config = LdapSchemaConfig::from_reader(reader).unwrap();

        assert_eq!(config.url(), "ldap://ldap.example.com:389");
        assert!(config.bind_dn.is_empty());
        assert!(config.bind_password.is_none());
        assert!(config.schema_dn.is_none());
        assert!(config.verify_certificate);
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
        assert_eq!(config.ancestor_scope, AncestorScope::Transitive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_values() {
        let reader = make_reader(HashMap::from([
            ("LDAP_HOST", "dc1.corp.example.com"),
            ("LDAP_USE_SSL", "true"),
            ("LDAP_BIND_DN", "cn=admin,dc=example,dc=com"),
            ("LDAP_BIND_PASSWORD", "secret"),
            ("LDAP_SCHEMA_DN", "cn=Subschema"),
            ("LDAP_OPERATION_TIMEOUT_SECS", "5"),
            ("LDAP_ANCESTOR_SCOPE", "direct"),
        ]));
        let config = LdapSchemaConfig::from_reader(reader).unwrap();

        assert_eq!(config.url(), "ldaps://dc1.corp.example.com:636");
        assert_eq!(config.bind_dn, "cn=admin,dc=example,dc=com");
        assert_eq!(config.schema_dn.as_deref(), Some("cn=Subschema"));
        assert_eq!(config.operation_timeout(), Duration::from_secs(5));
        assert_eq!(config.ancestor_scope, AncestorScope::Direct);
    }

    #[test]
    fn test_invalid_port() {
        let reader = make_reader(HashMap::from([
            ("LDAP_HOST", "ldap.example.com"),
            ("LDAP_PORT", "not-a-port"),
        ]));
        let err = LdapSchemaConfig::from_reader(reader).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
        assert!(err.to_string().contains("LDAP_PORT"));
    }

    #[test]
    fn test_invalid_scope() {
        let reader = make_reader(HashMap::from([
            ("LDAP_HOST", "ldap.example.com"),
            ("LDAP_ANCESTOR_SCOPE", "sideways"),
        ]));
        let err = LdapSchemaConfig::from_reader(reader).unwrap_err();
        assert!(err.to_string().contains("LDAP_ANCESTOR_SCOPE"));
    }

    #[test]
    fn test_validate_rejects_ssl_and_starttls() {
        let config = LdapSchemaConfig::new("ldap.example.com")
            .with_ssl()
            .with_starttls();
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_validate_rejects_password_without_dn() {
        let mut config = LdapSchemaConfig::new("ldap.example.com");
        config.bind_password = Some("secret".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        assert!(LdapSchemaConfig::new("").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = LdapSchemaConfig::new("ldap.example.com")
            .with_bind("cn=admin,dc=example,dc=com", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***REDACTED***"));

        let redacted = config.redacted();
        assert_eq!(redacted.bind_password.as_deref(), Some("***REDACTED***"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: LdapSchemaConfig = serde_json::from_value(serde_json::json!({
            "host": "ldap.example.com",
            "bind_dn": "cn=reader,dc=example,dc=com",
            "bind_password": "secret",
            "ancestor_scope": "direct"
        }))
        .unwrap();

        assert_eq!(config.port, 389);
        assert_eq!(config.operation_timeout_secs, 60);
        assert_eq!(config.ancestor_scope, AncestorScope::Direct);
        assert!(config.validate().is_ok());
    }
}
