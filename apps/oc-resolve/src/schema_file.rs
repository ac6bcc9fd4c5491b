//! Offline schema files
//!
//! Accepts the `objectClasses` values of a subschema entry, one per line, as
//! printed by `ldapsearch -b cn=schema -s base objectClasses` (LDIF folding
//! and the attribute prefix are handled) or as bare definitions.

use std::path::Path;

use xavyo_connector_ldap::SuperclassIndex;
use xavyo_oc_hierarchy::{AncestorScope, InMemorySchemaQuerier};

use crate::error::{CliError, CliResult};

/// Load a schema file into an in-memory schema source.
pub fn load(path: &Path, scope: AncestorScope) -> CliResult<InMemorySchemaQuerier> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::SchemaFile {
        path: path.display().to_string(),
        source,
    })?;

    let index = SuperclassIndex::from_definitions(definitions(&contents));
    tracing::info!(
        path = %path.display(),
        object_class_count = index.len(),
        "Loaded schema file"
    );

    Ok(InMemorySchemaQuerier::with_parents(index.into_parents()).with_scope(scope))
}

/// Unfold LDIF lines and keep only object class definitions.
fn definitions(contents: &str) -> Vec<String> {
    let mut unfolded: Vec<String> = Vec::new();
    for line in contents.lines() {
        match (line.strip_prefix(' '), unfolded.last_mut()) {
            (Some(continuation), Some(previous)) => previous.push_str(continuation),
            _ => unfolded.push(line.to_string()),
        }
    }

    unfolded
        .into_iter()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.split_once(':') {
                Some((attr, value)) if attr.eq_ignore_ascii_case("objectClasses") => {
                    Some(value.trim().to_string())
                }
                _ if line.starts_with('(') => Some(line.to_string()),
                _ => None,
            }
        })
        .collect()
}
