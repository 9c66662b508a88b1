//! Error types for depscout-deps

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using depscout-deps Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in depscout-deps
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registry lookup error
    #[error("Registry error: {0}")]
    Registry(#[from] depscout_registry::Error),

    /// Manifest could not be parsed into a descriptor
    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest {
        /// Manifest path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Malformed glob pattern
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// External package-manager command could not run to completion
    #[error("Command '{program}' failed: {message}")]
    Command {
        /// Program name
        program: String,
        /// Spawn error, timeout, or exit description
        message: String,
    },

    /// The enrichment worker pool was interrupted before all tasks finished
    #[error("Dependency resolution interrupted: {0}")]
    Interrupted(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error must abort the whole run.
    ///
    /// Only an interrupted worker pool qualifies; every other failure degrades
    /// to fewer facts about the dependencies.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }

    pub(crate) fn invalid_manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidManifest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
