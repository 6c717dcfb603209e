//! Commands that read a project file.
//!
//! Member paths are resolved against the directory holding the project
//! file, the same way an open session resolves them.

use std::path::Path;

use anyhow::{Context, Result};

use crate::project::{Project, ProjectConfig, paths};

fn load_project(path: &Path) -> Result<Project> {
    let config = ProjectConfig::load(path)
        .with_context(|| format!("failed to read project file '{}'", path.display()))?;
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let base_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => paths::absolutize(dir, &cwd),
        _ => cwd,
    };
    Ok(Project::from_config(&base_dir, &config))
}

/// Print canonical member paths, one per line.
pub fn run_files(path: &Path) -> Result<()> {
    let project = load_project(path)?;
    if project.files.is_empty() {
        eprintln!("No files in project");
        return Ok(());
    }
    for file in project.files.iter() {
        println!("{}", file.display());
    }
    Ok(())
}

/// Print each compiler flag on its own line.
pub fn run_flags(path: &Path) -> Result<()> {
    let project = load_project(path)?;
    for arg in project.flags.args() {
        println!("{arg}");
    }
    Ok(())
}
