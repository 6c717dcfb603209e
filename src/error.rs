//! Error types for the translation unit lifecycle.
//!
//! Frontend status codes never leave the crate raw; they are wrapped in
//! one of the variants below. "Not found" conditions (untracked document,
//! no translation unit yet) are plain `bool`/`Option` returns instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::frontend::ErrorCode;

#[derive(Error, Debug)]
pub enum CdkError {
    /// The shared parsing context could not be created. Fatal to project open.
    #[error("Failed to create source index: frontend error '{code}'")]
    IndexCreation { code: ErrorCode },

    /// A translation unit could not be built. The document is not tracked.
    #[error("Failed to parse translation unit '{path}': frontend error '{code}'")]
    Parse { path: PathBuf, code: ErrorCode },

    /// A reparse failed. The previous snapshot stays in place.
    #[error("Failed to reparse translation unit '{path}': frontend error '{code}'")]
    Reparse { path: PathBuf, code: ErrorCode },

    /// Compiler flags did not tokenize. The previous flag set stays in effect.
    #[error("Failed to parse compiler flags '{flags}': {reason}")]
    FlagParse { flags: String, reason: String },

    /// A dependent consumer failed while refreshing from a fresh snapshot.
    #[error("Helper '{helper}' failed to refresh '{path}': {reason}")]
    ConsumerRefresh {
        helper: String,
        path: PathBuf,
        reason: String,
    },

    /// A frontend query made on behalf of a helper failed.
    #[error("Frontend {operation} failed: frontend error '{code}'")]
    Frontend {
        operation: &'static str,
        code: ErrorCode,
    },

    #[error("No project is open")]
    ProjectClosed,

    #[error("Translation unit for '{path}' was already disposed")]
    Disposed { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Box<figment::Error>> for CdkError {
    fn from(e: Box<figment::Error>) -> Self {
        CdkError::Config(e.to_string())
    }
}

impl From<toml::de::Error> for CdkError {
    fn from(e: toml::de::Error) -> Self {
        CdkError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for CdkError {
    fn from(e: toml::ser::Error) -> Self {
        CdkError::Config(e.to_string())
    }
}

pub type CdkResult<T> = Result<T, CdkError>;
