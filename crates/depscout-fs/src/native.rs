//! Native file system implementation using std::fs + tokio.

use crate::{build_exclude_set, DiscoveryOptions, FileSystem};
use globset::GlobSet;
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::task;

/// Native file system implementation.
///
/// Blocking std::fs calls run on tokio's blocking pool so they never stall
/// the async runtime that drives collectors and registry lookups.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a new native file system scoped to a project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root doesn't exist or can't be canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let project_root = project_root.as_ref().canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!(
                    "Project root does not exist: {}",
                    project_root.as_ref().display()
                ),
            )
        })?;

        Ok(Self { project_root })
    }

    /// Validate that a path is within the project root.
    ///
    /// Relative paths are resolved against the root. Paths that don't exist
    /// yet are checked syntactically.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let resolved = absolute
            .canonicalize()
            .unwrap_or_else(|_| normalize_syntactically(&absolute));

        if !resolved.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside project root {}",
                    resolved.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(resolved)
    }
}

fn normalize_syntactically(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                result.pop();
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || Ok(validated.exists()))
            .await
            .map_err(io::Error::other)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read_to_string(&validated))
            .await
            .map_err(io::Error::other)?
    }

    async fn find_files(
        &self,
        root: &Path,
        file_names: &[&str],
        exclude_patterns: &[String],
        options: &DiscoveryOptions,
    ) -> io::Result<BTreeSet<PathBuf>> {
        let validated_root = self.validate_path(root)?;
        let file_names: Vec<String> = file_names.iter().map(|s| s.to_string()).collect();
        let excludes = build_exclude_set(exclude_patterns)?;
        let opts = options.clone();

        task::spawn_blocking(move || find_files_sync(&validated_root, &file_names, &excludes, &opts))
            .await
            .map_err(io::Error::other)?
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}

fn find_files_sync(
    root: &Path,
    file_names: &[String],
    excludes: &GlobSet,
    options: &DiscoveryOptions,
) -> io::Result<BTreeSet<PathBuf>> {
    let mut found = BTreeSet::new();

    let mut walker = WalkBuilder::new(root);
    walker
        .follow_links(options.follow_symlinks)
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .ignore(options.respect_gitignore)
        .parents(options.respect_gitignore)
        .max_depth(Some(options.max_depth));

    for result in walker.build() {
        let entry = result.map_err(io::Error::other)?;

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let matches_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| file_names.iter().any(|wanted| wanted == n));
        if !matches_name {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if excludes.is_match(relative) {
            continue;
        }

        found.insert(path.to_path_buf());
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let fs = NativeFileSystem::new(temp_dir.path()).unwrap();

        let err = fs
            .read_to_string(Path::new("../outside.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_normalize_syntactically() {
        let normalized = normalize_syntactically(Path::new("/a/b/../c/./d"));
        assert_eq!(normalized, PathBuf::from("/a/c/d"));
    }
}
