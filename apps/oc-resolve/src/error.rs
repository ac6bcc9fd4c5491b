//! CLI error types and exit codes

use thiserror::Error;
use xavyo_oc_hierarchy::{ConfigError, SchemaError};

pub type CliResult<T> = Result<T, CliError>;

/// CLI errors.
///
/// Exit codes:
/// - 0: Success
/// - 1: General error
/// - 3: Schema source unreachable
/// - 4: Configuration error
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Cannot read schema file {path}: {source}")]
    SchemaFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 4,
            CliError::Schema(SchemaError::InvalidConfiguration { .. }) => 4,
            CliError::Schema(e) if e.is_transient() => 3,
            CliError::Schema(_) | CliError::SchemaFile { .. } => 1,
        }
    }
}
