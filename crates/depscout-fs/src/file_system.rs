//! FileSystem trait for manifest reading and discovery.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// Options for manifest discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Follow symbolic links (default: false).
    pub follow_symlinks: bool,

    /// Maximum directory depth (default: 100).
    pub max_depth: usize,

    /// Include hidden files and directories (default: false).
    pub include_hidden: bool,

    /// Respect .gitignore files (default: false).
    ///
    /// Vendored dependency folders are usually gitignored, but their manifests
    /// are exactly what the manifest-only fallback needs to read.
    pub respect_gitignore: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            max_depth: 100,
            include_hidden: false,
            respect_gitignore: false,
        }
    }
}

/// Async file system abstraction.
///
/// # Error Handling
///
/// Uses `std::io::Result<T>`:
/// - Native: direct mapping from std::fs errors
/// - Memory: `io::Error` built with the matching `ErrorKind`
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if file doesn't exist.
    /// Returns `io::ErrorKind::InvalidData` if file is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Find files named one of `file_names` below `root`.
    ///
    /// `exclude_patterns` are glob patterns matched against the path relative
    /// to `root`, e.g. `**/test/**/package.json`.
    ///
    /// Returns absolute paths in a sorted set so callers iterate deterministically.
    async fn find_files(
        &self,
        root: &Path,
        file_names: &[&str],
        exclude_patterns: &[String],
        options: &DiscoveryOptions,
    ) -> io::Result<BTreeSet<PathBuf>>;

    /// Get the project root this file system is scoped to.
    fn project_root(&self) -> &Path;
}

/// Compile exclusion globs into a single set.
///
/// # Errors
///
/// Returns `io::ErrorKind::InvalidInput` for a malformed pattern.
pub fn build_exclude_set(patterns: &[String]) -> io::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
