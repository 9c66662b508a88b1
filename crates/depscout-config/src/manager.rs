use crate::security::set_config_permissions;
use crate::types::DepscoutConfig;
use depscout_fs::{FileSystem, NativeFileSystem};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Home directory not found")]
    HomeNotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Manager for depscout configuration
///
/// Manages the configuration stored in ~/.depscout/config.toml, or at an
/// explicit path. Loaded configurations are always validated.
pub struct ConfigManager<F: FileSystem = NativeFileSystem> {
    fs: Arc<F>,
    config_path: PathBuf,
    config: DepscoutConfig,
}

impl ConfigManager {
    /// Get the default config path (~/.depscout/config.toml)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".depscout").join("config.toml"))
    }

    /// Load config from default location
    pub async fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path).await
    }

    /// Load config from specific path
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let fs = match NativeFileSystem::new(config_dir) {
            Ok(fs) => Arc::new(fs),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::load_with_filesystem(fs, path).await
    }

    /// Resolve the effective configuration for one run.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub async fn resolve(path: Option<&Path>) -> Result<DepscoutConfig, ConfigError> {
        if let Some(path) = path {
            return Ok(Self::load_from(path).await?.config);
        }

        let default_path = match Self::config_path() {
            Ok(path) => path,
            Err(ConfigError::HomeNotFound) => {
                tracing::debug!("No home directory, using default configuration");
                return Ok(DepscoutConfig::default());
            }
            Err(e) => return Err(e),
        };
        match Self::load_from(&default_path).await {
            Ok(manager) => Ok(manager.config),
            Err(ConfigError::ConfigNotFound(_)) => {
                tracing::debug!(path = %default_path.display(), "No config file, using defaults");
                Ok(DepscoutConfig::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Initialize config at specific path
    pub async fn init_at(path: &Path) -> Result<Self, ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let fs = Arc::new(NativeFileSystem::new(config_dir)?);

        let manager = Self {
            fs,
            config_path: path.to_path_buf(),
            config: DepscoutConfig::default(),
        };
        manager.save().await?;
        Ok(manager)
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and atomic rename to prevent corruption
    pub async fn save(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        let toml_str = toml::to_string_pretty(&self.config)?;

        let temp_path = self.config_path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, toml_str).await?;

        // The file may carry an access token
        set_config_permissions(&temp_path)?;

        tokio::fs::rename(&temp_path, &self.config_path).await?;
        Ok(())
    }
}

impl<F: FileSystem> ConfigManager<F> {
    /// Load config with a custom FileSystem
    pub async fn load_with_filesystem(fs: Arc<F>, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path).await.map_err(ConfigError::Io)? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = fs.read_to_string(path).await.map_err(ConfigError::Io)?;
        let config: DepscoutConfig = toml::from_str(&contents)?;
        config.validate()?;

        Ok(Self {
            fs,
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Get reference to config
    pub fn config(&self) -> &DepscoutConfig {
        &self.config
    }

    /// Get mutable reference to config (caller must call save())
    pub fn config_mut(&mut self) -> &mut DepscoutConfig {
        &mut self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// File system the config was read through
    pub fn file_system(&self) -> &Arc<F> {
        &self.fs
    }
}
