pub mod manager;
pub mod security;
pub mod types;

pub use manager::{ConfigError, ConfigManager};
pub use security::set_config_permissions;
pub use types::{DepscoutConfig, NpmSettings, RegistrySettings, ResolverSettings};
