//! CLI error types and exit code mapping

use depscout_config::ConfigError;
use std::path::PathBuf;

/// CLI-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The enrichment pool was interrupted; no partial result is reported
    #[error("dependency resolution interrupted: {0}")]
    Interrupted(String),

    /// No manifest of a supported ecosystem below the project path
    #[error("no supported manifest found under {}", .0.display())]
    NothingToResolve(PathBuf),

    #[error("registry client error: {0}")]
    Registry(#[from] depscout_registry::Error),

    #[error("{0}")]
    Resolution(depscout_deps::Error),

    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0:#}")]
    Command(#[from] anyhow::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General error                   |
    /// | 2    | Configuration error             |
    /// | 3    | Resolution interrupted          |
    /// | 4    | Nothing to resolve              |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Interrupted(_) => 3,
            Self::NothingToResolve(_) => 4,
            Self::Registry(_)
            | Self::Resolution(_)
            | Self::JsonSerialize(_)
            | Self::Io(_)
            | Self::Command(_) => 1,
        }
    }
}

impl From<depscout_deps::Error> for CliError {
    fn from(e: depscout_deps::Error) -> Self {
        match e {
            depscout_deps::Error::Interrupted(message) => Self::Interrupted(message),
            other => Self::Resolution(other),
        }
    }
}
