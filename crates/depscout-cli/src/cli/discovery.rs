//! Grouping of discovered manifests into independently resolved projects.

use depscout_deps::exclusion::is_vendored;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One top-level folder and the manifests found below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelProject {
    pub top_level_folder: PathBuf,
    pub manifests: BTreeSet<PathBuf>,
}

/// Group manifests under their top-level folders.
///
/// A top-level folder is the directory of a non-vendored manifest that is not
/// already inside another top-level folder. Shallower folders win, so a
/// workspace root swallows its member packages, which the resolver then
/// collects as modules. Manifests outside every top-level folder are dropped.
pub fn group_by_top_level(
    project: &Path,
    manifests: BTreeSet<PathBuf>,
    vendor_folder: &str,
) -> Vec<TopLevelProject> {
    let mut candidates: Vec<PathBuf> = manifests
        .iter()
        .filter(|path| !is_vendored(project, path, vendor_folder))
        .filter_map(|path| path.parent().map(Path::to_path_buf))
        .collect();
    candidates.sort_by_key(|dir| (dir.components().count(), dir.clone()));

    let mut tops: Vec<PathBuf> = Vec::new();
    for dir in candidates {
        if !tops.iter().any(|top| dir.starts_with(top)) {
            tops.push(dir);
        }
    }

    tops.into_iter()
        .map(|top| TopLevelProject {
            manifests: manifests
                .iter()
                .filter(|path| path.starts_with(&top))
                .cloned()
                .collect(),
            top_level_folder: top,
        })
        .collect()
}
