//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Inspect C/C++ project configuration for semantic tracking.
#[derive(Parser)]
#[command(name = "cdk", version, styles = clap_cargo_style())]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up .cdk directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// List the resolved member files of a project, in order
    Files {
        /// Project file containing a [cdk] table
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },

    /// Show the tokenized compiler flags of a project
    Flags {
        /// Project file containing a [cdk] table
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
}
