//! Definition bundle validation

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use keystone_definitions::{DefinitionLimits, DefinitionLoader, DefinitionStore};
use keystone_types::{roles, DefinitionBundle, RoleDirectory, RoleId};
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

/// Roles known to an offline check: the built-in three plus any named on
/// the command line.
#[derive(Debug, Default)]
pub struct KnownRoles {
    roles: HashSet<RoleId>,
}

impl KnownRoles {
    pub fn new<'a>(extra: impl IntoIterator<Item = &'a str>) -> Self {
        let mut roles: HashSet<RoleId> = [roles::owner(), roles::broadcaster(), roles::recovery()]
            .into_iter()
            .collect();
        roles.extend(extra.into_iter().map(RoleId::from_name));
        Self { roles }
    }
}

impl RoleDirectory for KnownRoles {
    fn role_exists(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }
}

/// Apply the bundle at `path` to an empty store and report what it would
/// register.
pub fn execute(
    path: &Path,
    extra_roles: &[String],
    allow_protected: bool,
    limits: DefinitionLimits,
    out: &mut dyn Write,
) -> CliResult<()> {
    let contents = std::fs::read_to_string(path)?;
    let bundle: DefinitionBundle = serde_json::from_str(&contents)
        .map_err(|e| CliError::InvalidInput(format!("{}: {}", path.display(), e)))?;
    debug!(
        path = %path.display(),
        schemas = bundle.schemas.len(),
        permissions = bundle.grants.permissions.len(),
        "Bundle parsed"
    );

    let known = KnownRoles::new(extra_roles.iter().map(String::as_str));
    let loader = DefinitionLoader::new(limits, Arc::new(known));
    let mut store = DefinitionStore::default();
    let report = loader.load_bundle(&mut store, &bundle, allow_protected)?;

    info!(path = %path.display(), "Bundle accepted");
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
