//! Glob patterns shared with the surrounding file scan

use crate::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};

/// Source-file exclusion patterns for a resolved project.
///
/// Patterns are relative to `project_folder` and prefixed with the path of
/// `top_level_folder` below it. With `ignore_source_files` every source file
/// of the ecosystem is excluded; otherwise only the copies inside the
/// vendored-dependency folder are.
pub fn source_excludes(
    project_folder: &Path,
    top_level_folder: &Path,
    vendor_folder: &str,
    extensions: &[&str],
    ignore_source_files: bool,
) -> Vec<String> {
    let prefix = relative_prefix(project_folder, top_level_folder);
    extensions
        .iter()
        .map(|ext| {
            if ignore_source_files {
                format!("{prefix}**/*.{ext}")
            } else {
                format!("{prefix}{vendor_folder}/**/*.{ext}")
            }
        })
        .collect()
}

/// `top/` relative to `project`, with forward slashes; empty when they match
/// or `top` is not below `project`.
fn relative_prefix(project_folder: &Path, top_level_folder: &Path) -> String {
    let Ok(relative) = top_level_folder.strip_prefix(project_folder) else {
        return String::new();
    };
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("{}/", parts.join("/"))
    }
}

/// Compile manifest exclusion patterns
///
/// # Errors
/// Returns [`crate::Error::Pattern`] for a malformed pattern
pub fn compile(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Whether `path` lies inside a `vendor_folder` directory below `root`
pub fn is_vendored(root: &Path, path: &Path, vendor_folder: &str) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(part) if part == vendor_folder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_vendored_only_excludes() {
        let patterns = source_excludes(
            Path::new("/repo"),
            Path::new("/repo"),
            "node_modules",
            &["js", "ts"],
            false,
        );
        assert_eq!(patterns, ["node_modules/**/*.js", "node_modules/**/*.ts"]);
    }

    #[test]
    fn test_ignore_source_files_with_nested_top_folder() {
        let patterns = source_excludes(
            Path::new("/repo"),
            Path::new("/repo/web/app"),
            "node_modules",
            &["tsx"],
            true,
        );
        assert_eq!(patterns, ["web/app/**/*.tsx"]);
    }

    #[test]
    fn test_unrelated_top_folder_has_no_prefix() {
        assert_eq!(relative_prefix(Path::new("/repo"), Path::new("/elsewhere")), "");
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        assert!(compile(&["**/test/**/package.json".to_string()]).is_ok());
        assert!(matches!(
            compile(&["a/[".to_string()]),
            Err(crate::Error::Pattern(_))
        ));
    }

    #[test]
    fn test_is_vendored() {
        let root = PathBuf::from("/repo");
        assert!(is_vendored(&root, Path::new("/repo/node_modules/a/package.json"), "node_modules"));
        assert!(!is_vendored(&root, Path::new("/repo/packages/a/package.json"), "node_modules"));
        assert!(!is_vendored(&root, Path::new("/repo/my_node_modules_x/package.json"), "node_modules"));
    }
}
