//! In-memory file system implementation.

use crate::{build_exclude_set, DiscoveryOptions, FileSystem};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// In-memory file system.
///
/// Files are registered up front (or with [`MemoryFileSystem::add_file`]) and
/// directories are implicit: a directory exists when some file lives below it.
///
/// # Thread Safety
///
/// Uses `Arc<RwLock<BTreeMap>>`:
/// - Multiple concurrent readers (common case)
/// - Exclusive writer (rare: only during setup)
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    project_root: PathBuf,
    files: Arc<RwLock<BTreeMap<PathBuf, String>>>,
}

impl MemoryFileSystem {
    /// Create an in-memory file system from pre-loaded files.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::InvalidInput` if a file lies outside `project_root`.
    pub fn new<I, P, S>(project_root: impl AsRef<Path>, files: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: Into<String>,
    {
        let project_root = normalize_path(project_root.as_ref())?;
        let fs = Self {
            project_root,
            files: Arc::new(RwLock::new(BTreeMap::new())),
        };

        for (path, contents) in files {
            fs.add_file(path, contents).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
            })?;
        }

        Ok(fs)
    }

    /// Create an empty in-memory file system.
    pub fn empty(project_root: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(project_root, Vec::<(PathBuf, String)>::new())
    }

    /// Add a file (relative paths are resolved against the project root).
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) -> io::Result<()> {
        let normalized = self.validate_path(path.as_ref())?;
        self.files.write().insert(normalized, contents.into());
        Ok(())
    }

    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let normalized = normalize_path(&absolute)?;

        if !normalized.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside {}",
                    normalized.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(normalized)
    }
}

/// Syntactic normalization: drops `.` and resolves `..` without touching a disk.
fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "Path attempts to escape root using ..",
                    ));
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    Ok(result)
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let normalized = self.validate_path(path)?;
        let files = self.files.read();
        Ok(files.contains_key(&normalized) || files.keys().any(|p| p.starts_with(&normalized)))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let normalized = self.validate_path(path)?;
        self.files.read().get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", normalized.display()),
            )
        })
    }

    async fn find_files(
        &self,
        root: &Path,
        file_names: &[&str],
        exclude_patterns: &[String],
        options: &DiscoveryOptions,
    ) -> io::Result<BTreeSet<PathBuf>> {
        let root = self.validate_path(root)?;
        let excludes = build_exclude_set(exclude_patterns)?;
        let files = self.files.read();

        let found = files
            .keys()
            .filter_map(|path| {
                let relative = path.strip_prefix(&root).ok()?;
                if relative.components().count() > options.max_depth {
                    return None;
                }
                if !options.include_hidden
                    && relative
                        .components()
                        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
                {
                    return None;
                }
                let name = path.file_name()?.to_str()?;
                if !file_names.contains(&name) || excludes.is_match(relative) {
                    return None;
                }
                Some(path.clone())
            })
            .collect();

        Ok(found)
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
