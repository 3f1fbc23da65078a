//! Selector and role id derivation

use std::io::Write;

use keystone_types::{RoleId, Selector};

use crate::error::CliResult;

/// Print the selector derived from a canonical signature.
pub fn execute(signature: &str, role: bool, out: &mut dyn Write) -> CliResult<()> {
    if role {
        writeln!(out, "{}", RoleId::from_name(signature))?;
    } else {
        writeln!(out, "{}", Selector::from_signature(signature))?;
    }
    Ok(())
}
