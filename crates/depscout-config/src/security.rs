use std::fs;
use std::path::Path;

/// Restrict a config file to its owner; it may hold a registry access token.
#[cfg(unix)]
pub fn set_config_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600); // rw-------
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Set config permissions (no-op on Windows for now)
#[cfg(not(unix))]
pub fn set_config_permissions(path: &Path) -> std::io::Result<()> {
    fs::metadata(path).map(|_| ())
}
