use anyhow::Result;
use clap::Parser;

use cdk::Settings;
use cdk::cli::commands::{init, project};
use cdk::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Falling back to defaults");
        Settings::default()
    });

    cdk::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        Commands::Files { project: path } => project::run_files(&path),
        Commands::Flags { project: path } => project::run_flags(&path),
    }
}
