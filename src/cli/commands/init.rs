//! Init and Config commands.

use anyhow::{Context, Result};

use crate::config::Settings;

/// Create `.cdk/settings.toml` in the working directory.
pub fn run_init(force: bool) -> Result<()> {
    let path = Settings::init_config_file(force).context("failed to initialize configuration")?;
    if force {
        println!("Wrote default configuration to: {}", path.display());
    } else {
        println!("Created configuration file at: {}", path.display());
    }
    println!("Edit this file to customize your settings.");
    Ok(())
}

/// Print the effective configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    let toml_str = toml::to_string_pretty(config).context("failed to render configuration")?;
    println!("{toml_str}");
    Ok(())
}
