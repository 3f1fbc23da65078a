//! Factory built-in definitions

use std::io::Write;

use keystone_factory::factory_bundle;

use crate::error::CliResult;

/// Print the bundle every factory installs at construction, as JSON.
pub fn execute(out: &mut dyn Write) -> CliResult<()> {
    let bundle = factory_bundle();
    serde_json::to_writer_pretty(&mut *out, &bundle)?;
    writeln!(out)?;
    Ok(())
}
