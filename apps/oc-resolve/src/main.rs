//! oc-resolve - print the most specific object class among candidates
//!
//! The schema comes from an LDAP server configured through `LDAP_*`
//! environment variables, or from an offline dump with `--schema-file`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xavyo_connector_ldap::{LdapSchemaConfig, LdapSchemaQuerier};
use xavyo_oc_hierarchy::prelude::*;

mod error;
mod schema_file;

use error::CliResult;

/// Resolve the most specific LDAP object class
#[derive(Parser, Debug)]
#[command(name = "oc-resolve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Class returned when no candidate is provably more specific
    #[arg(short, long)]
    reference: String,

    /// Read object class definitions from a file instead of an LDAP server
    #[arg(long, value_name = "PATH")]
    schema_file: Option<PathBuf>,

    /// Report direct superclasses only instead of the full chain
    #[arg(long)]
    direct: bool,

    /// Candidate object classes, in visiting order
    candidates: Vec<String>,
}

impl Cli {
    fn scope(&self) -> Option<AncestorScope> {
        self.direct.then_some(AncestorScope::Direct)
    }
}

async fn run(cli: Cli) -> CliResult<ClassName> {
    let resolver_config = ResolverConfig::from_env()?;

    let (querier, ldap): (Arc<dyn SchemaQuerier>, Option<Arc<LdapSchemaQuerier>>) =
        match &cli.schema_file {
            Some(path) => {
                let scope = cli.scope().unwrap_or_default();
                let offline: Arc<dyn SchemaQuerier> = Arc::new(schema_file::load(path, scope)?);
                (offline, None)
            }
            None => {
                let mut config = LdapSchemaConfig::from_env()?;
                if let Some(scope) = cli.scope() {
                    config.ancestor_scope = scope;
                }
                tracing::debug!(config = ?config, "Using LDAP schema source");
                let ldap = Arc::new(LdapSchemaQuerier::new(config)?);
                let querier: Arc<dyn SchemaQuerier> = ldap.clone();
                (querier, Some(ldap))
            }
        };

    let resolver = SpecificityResolver::from_config(
        &resolver_config,
        querier,
        Arc::new(SuperclassCache::new()),
    );

    let candidates: Vec<ClassName> = cli
        .candidates
        .iter()
        .map(|c| ClassName::from(c.as_str()))
        .collect();
    let result = resolver
        .resolve_most_specific(&candidates, &ClassName::from(cli.reference.as_str()))
        .await;

    if let Some(ldap) = ldap {
        ldap.dispose().await?;
    }

    Ok(result?)
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(class) => println!("{class}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
