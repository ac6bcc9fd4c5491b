//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Prefix of the object classes this platform defines itself.
pub const DEFAULT_INTERNAL_CLASS_PREFIX: &str = "xavyo";

/// Configuration for the specificity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Classes starting with this prefix are internal extension classes and
    /// are never looked up in the directory schema. `None` disables the rule.
    #[serde(default = "default_internal_class_prefix")]
    pub internal_class_prefix: Option<String>,
}

fn default_internal_class_prefix() -> Option<String> {
    Some(DEFAULT_INTERNAL_CLASS_PREFIX.to_string())
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            internal_class_prefix: default_internal_class_prefix(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// `OC_INTERNAL_CLASS_PREFIX` set to an empty string disables the
    /// internal class rule.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let internal_class_prefix = match reader("OC_INTERNAL_CLASS_PREFIX") {
            Ok(prefix) if prefix.trim().is_empty() => None,
            Ok(prefix) => Some(prefix.trim().to_string()),
            Err(std::env::VarError::NotPresent) => default_internal_class_prefix(),
            Err(e) => {
                return Err(ConfigError::InvalidValue(
                    "OC_INTERNAL_CLASS_PREFIX".into(),
                    e.to_string(),
                ))
            }
        };

        Ok(Self {
            internal_class_prefix,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
