use crate::manager::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for depscout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepscoutConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Resolution settings shared by all ecosystems
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// npm / yarn settings
    #[serde(default)]
    pub npm: NpmSettings,

    /// Registry lookup settings
    #[serde(default)]
    pub registry: RegistrySettings,
}

impl Default for DepscoutConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            resolver: ResolverSettings::default(),
            npm: NpmSettings::default(),
            registry: RegistrySettings::default(),
        }
    }
}

impl DepscoutConfig {
    /// Reject values the resolver cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.worker_count == 0 {
            return Err(ConfigError::Invalid(
                "resolver.worker_count must be greater than 0".to_string(),
            ));
        }
        if self.npm.ls_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "npm.ls_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.npm.install_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "npm.install_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.registry.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "registry.timeout_secs must be greater than 0".to_string(),
            ));
        }
        url::Url::parse(&self.npm.default_registry).map_err(|e| {
            ConfigError::Invalid(format!(
                "npm.default_registry '{}' is not a valid URL: {e}",
                self.npm.default_registry
            ))
        })?;
        Ok(())
    }
}

/// Resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverSettings {
    /// Enrichment pool width
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Exclude every first-party source file, not only vendored copies
    #[serde(default)]
    pub ignore_source_files: bool,

    /// Run the package manager's install step before collecting
    #[serde(default)]
    pub run_pre_step: bool,

    /// Manifest globs skipped on top of the built-in ones
    #[serde(default)]
    pub extra_manifest_excludes: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            ignore_source_files: false,
            run_pre_step: false,
            extra_manifest_excludes: Vec::new(),
        }
    }
}

/// npm and yarn settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpmSettings {
    /// Include devDependencies in the collected tree
    #[serde(default)]
    pub include_dev_dependencies: bool,

    /// Time limit for `npm ls` / `yarn list`
    #[serde(default = "default_ls_timeout")]
    pub ls_timeout_secs: u64,

    /// Time limit for the install step
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,

    /// Accept a non-zero `npm ls` exit when its output parsed
    #[serde(default)]
    pub ignore_ls_errors: bool,

    /// Pass `--ignore-scripts` to the install step
    #[serde(default)]
    pub ignore_scripts: bool,

    /// Collect with yarn instead of npm
    #[serde(default)]
    pub yarn: bool,

    /// Registry access token; empty means none
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,

    /// Registry used for packages whose manifest does not say where they came from
    #[serde(default = "default_registry")]
    pub default_registry: String,
}

impl Default for NpmSettings {
    fn default() -> Self {
        Self {
            include_dev_dependencies: false,
            ls_timeout_secs: default_ls_timeout(),
            install_timeout_secs: default_install_timeout(),
            ignore_ls_errors: false,
            ignore_scripts: false,
            yarn: false,
            access_token: String::new(),
            default_registry: default_registry(),
        }
    }
}

impl NpmSettings {
    pub fn access_token(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn ls_timeout(&self) -> Duration {
        Duration::from_secs(self.ls_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}

/// Registry lookup settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrySettings {
    /// `false` never issues lookups
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-request timeout
    #[serde(default = "default_registry_timeout")]
    pub timeout_secs: u64,

    /// Client-side rate limit; 0 disables it
    #[serde(default)]
    pub requests_per_second: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_registry_timeout(),
            requests_per_second: 0,
        }
    }
}

impl RegistrySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions
fn default_version() -> String {
    "1.0".to_string()
}

fn default_worker_count() -> usize {
    8
}

fn default_ls_timeout() -> u64 {
    60
}

fn default_install_timeout() -> u64 {
    600
}

fn default_registry() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_registry_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
