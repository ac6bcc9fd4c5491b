//! Schema source error types
//!
//! Errors raised while learning the object class hierarchy from a schema
//! source. Resolution never produces an error of its own; everything here
//! originates in a [`SchemaQuerier`](crate::querier::SchemaQuerier).

use thiserror::Error;

/// Error that can occur while querying a schema source.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Failed to establish a connection to the schema source.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The schema source did not answer in time.
    #[error("schema query timed out after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// The schema source rejected the bind credentials.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// The schema could not be read (missing subschema entry, rejected search, ...).
    #[error("schema unavailable: {message}")]
    SchemaUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The schema source is misconfigured.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl SchemaError {
    /// Check if this error is transient and the caller may retry.
    ///
    /// The resolver itself never retries; this is a hint for callers that own
    /// a retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SchemaError::ConnectionFailed { .. } | SchemaError::ConnectionTimeout { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            SchemaError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            SchemaError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            SchemaError::AuthenticationFailed => "AUTH_FAILED",
            SchemaError::SchemaUnavailable { .. } => "SCHEMA_UNAVAILABLE",
            SchemaError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        SchemaError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SchemaError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a schema unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        SchemaError::SchemaUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a schema unavailable error with source.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SchemaError::SchemaUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        SchemaError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for schema source operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
