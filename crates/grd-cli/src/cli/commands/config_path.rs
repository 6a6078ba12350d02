use anyhow::Result;
use grd_core::config;

/// Prints the resolved config file location (created on first `run`).
pub fn run_config_path() -> Result<()> {
    println!("{}", config::config_path()?.display());
    Ok(())
}
