//! Project state: membership, compiler flags, and the persisted `[cdk]` table.
//!
//! # Project file
//!
//! ```toml
//! [cdk]
//! cflags = "-std=c11 -Iinclude"
//! files = ["src/main.c", "src/util.c"]
//! ```
//!
//! `files` are stored relative to the project base directory and resolved
//! to canonical absolute paths on load.

pub mod files;
pub mod flags;
pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CdkResult;

pub use files::ProjectFileSet;
pub use flags::CompilerFlagSet;

/// The `[cdk]` table of a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CdkSection {
    /// Shell-style compiler flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cflags: Option<String>,

    /// Member files relative to the project base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PathBuf>>,
}

/// Persisted project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdk: Option<CdkSection>,
}

impl ProjectConfig {
    pub fn new(cflags: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            cdk: Some(CdkSection {
                cflags: Some(cflags.into()),
                files: Some(files),
            }),
        }
    }

    pub fn from_toml(content: &str) -> CdkResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> CdkResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a project file from disk.
    pub fn load(path: impl AsRef<Path>) -> CdkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Write a project file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> CdkResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn cflags(&self) -> Option<&str> {
        self.cdk.as_ref()?.cflags.as_deref()
    }

    pub fn files(&self) -> Option<&[PathBuf]> {
        self.cdk.as_ref()?.files.as_deref()
    }
}

/// State of an open project.
#[derive(Debug, Clone)]
pub struct Project {
    pub files: ProjectFileSet,
    pub flags: CompilerFlagSet,
}

impl Project {
    /// Build project state from a persisted configuration.
    ///
    /// Malformed flags are logged and leave the flag set empty; they never
    /// prevent the project from opening.
    pub fn from_config(base_dir: &Path, config: &ProjectConfig) -> Self {
        let mut project = Self {
            files: ProjectFileSet::new(base_dir),
            flags: CompilerFlagSet::new(),
        };

        if let Some(cflags) = config.cflags() {
            project.set_cflags(cflags);
        }
        if let Some(files) = config.files() {
            project.files.set_files(files);
        }

        project
    }

    /// Replace the compiler flags, keeping the previous set on a parse error.
    pub fn set_cflags(&mut self, cflags: &str) -> bool {
        match self.flags.set(cflags) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!("[project] {e}");
                false
            }
        }
    }

    /// Configuration to persist, with member paths made relative.
    pub fn to_config(&self) -> ProjectConfig {
        ProjectConfig::new(self.flags.to_command_line(), self.files.relative_paths())
    }

    pub fn base_dir(&self) -> &Path {
        self.files.base_dir()
    }
}
