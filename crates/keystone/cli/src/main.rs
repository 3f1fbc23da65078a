fn main() -> anyhow::Result<()> {
    keystone_cli::run()?;
    Ok(())
}
