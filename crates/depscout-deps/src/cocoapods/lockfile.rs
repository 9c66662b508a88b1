//! Podfile.lock parser

use crate::checksum::cocoapods_checksum;
use crate::types::{DependencyNode, Ecosystem};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// A top-level entry of the `PODS` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEntry {
    pub name: String,
    pub version: String,
    /// Names of the pods this one depends on
    pub dependencies: Vec<String>,
}

/// An entry of the `DEPENDENCIES` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRequirement {
    pub name: String,
    /// Version constraint as written, e.g. `= 1.0` or `~> 4.0`
    pub constraint: Option<String>,
}

/// The parts of a Podfile.lock dependency resolution cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodfileLock {
    pub pods: Vec<PodEntry>,
    pub dependencies: Vec<PodRequirement>,
    /// Version from the `COCOAPODS:` line
    pub cocoapods_version: Option<String>,
    /// Value of the `PODFILE CHECKSUM:` line
    pub podfile_checksum: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Pods,
    Dependencies,
}

// `  - Name (version):` or `    - Child (constraint)`
static ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)- ([^(]+?)(?: \(([^)]*)\))?:?\s*$").expect("static regex")
});

impl PodfileLock {
    /// Parse Podfile.lock text.
    ///
    /// Quoted entries (`- "Firebase/Core (10.0.0)":`) are unquoted first. A
    /// blank line or any new top-level key ends the current section.
    pub fn parse(content: &str) -> Self {
        let mut lock = Self::default();
        let mut section = Section::None;

        for raw in content.lines() {
            let line = raw.replace('"', "");

            if line.trim().is_empty() {
                section = Section::None;
                continue;
            }

            if !line.starts_with(char::is_whitespace) {
                section = Section::None;
                if line.starts_with("PODS:") {
                    section = Section::Pods;
                } else if line.starts_with("DEPENDENCIES:") {
                    section = Section::Dependencies;
                } else if let Some(version) = line.strip_prefix("COCOAPODS:") {
                    lock.cocoapods_version = Some(version.trim().to_string());
                } else if let Some(checksum) = line.strip_prefix("PODFILE CHECKSUM:") {
                    lock.podfile_checksum = Some(checksum.trim().to_string());
                }
                continue;
            }

            let Some(caps) = ITEM.captures(&line) else {
                continue;
            };
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            let name = caps.get(2).map_or("", |m| m.as_str().trim()).to_string();
            let version = caps.get(3).map(|m| m.as_str().to_string());

            match section {
                Section::Pods if indent <= 2 => lock.pods.push(PodEntry {
                    name,
                    version: version.unwrap_or_default(),
                    dependencies: Vec::new(),
                }),
                Section::Pods => {
                    if let Some(entry) = lock.pods.last_mut() {
                        entry.dependencies.push(name);
                    }
                }
                Section::Dependencies if indent <= 2 => lock.dependencies.push(PodRequirement {
                    name,
                    constraint: version,
                }),
                _ => {}
            }
        }

        lock
    }

    /// Build the dependency forest: one root per `DEPENDENCIES` entry, children
    /// resolved recursively through `PODS` entries.
    ///
    /// Requirements with no matching pod are skipped. Cycles are cut at the
    /// first repeated pod on a path.
    pub fn dependency_forest(&self, lockfile: &Path) -> Vec<DependencyNode> {
        let mut index: HashMap<&str, &PodEntry> = HashMap::new();
        for pod in &self.pods {
            index.entry(pod.name.as_str()).or_insert(pod);
        }

        let mut path = Vec::new();
        self.dependencies
            .iter()
            .filter_map(|req| build_node(&req.name, &index, &mut path, lockfile))
            .collect()
    }
}

fn build_node<'a>(
    name: &str,
    index: &HashMap<&'a str, &'a PodEntry>,
    path: &mut Vec<&'a str>,
    lockfile: &Path,
) -> Option<DependencyNode> {
    let (&key, entry) = index.get_key_value(name)?;
    if path.contains(&key) {
        tracing::debug!(pod = %name, "Dependency cycle in Podfile.lock");
        return None;
    }

    let mut node = pod_node(&entry.name, &entry.version, lockfile);
    path.push(key);
    node.children = entry
        .dependencies
        .iter()
        .filter_map(|child| build_node(child, index, path, lockfile))
        .collect();
    path.pop();
    Some(node)
}

/// A resolved pod with its deterministic checksum
pub fn pod_node(name: &str, version: &str, lockfile: &Path) -> DependencyNode {
    let mut node = DependencyNode::new(Ecosystem::CocoaPods, name, name, version);
    node.checksum = cocoapods_checksum(name, version);
    node.file_name = format!("{name}-{version}");
    node.system_path = Some(lockfile.to_path_buf());
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const LOCK: &str = r#"PODS:
  - AFNetworking (2.2.1):
    - AFNetworking/NSURLConnection (= 2.2.1)
  - AFNetworking/NSURLConnection (2.2.1)
  - "GoogleUtilities/Environment (7.11.0)":
    - PromisesObjC (< 3.0, >= 1.2)
  - PromisesObjC (2.2.0)

DEPENDENCIES:
  - AFNetworking (~> 2.2)
  - GoogleUtilities/Environment

SPEC REPOS:
  trunk:
    - AFNetworking

PODFILE CHECKSUM: 4d0c8a2b1f

COCOAPODS: 1.12.1
"#;

    #[test]
    fn test_parse_sections() {
        let lock = PodfileLock::parse(LOCK);

        assert_eq!(lock.pods.len(), 4);
        assert_eq!(lock.pods[0].name, "AFNetworking");
        assert_eq!(lock.pods[0].version, "2.2.1");
        assert_eq!(lock.pods[0].dependencies, ["AFNetworking/NSURLConnection"]);
        assert_eq!(lock.pods[2].name, "GoogleUtilities/Environment");
        assert_eq!(lock.pods[2].version, "7.11.0");

        assert_eq!(lock.dependencies.len(), 2);
        assert_eq!(lock.dependencies[0].constraint.as_deref(), Some("~> 2.2"));
        assert_eq!(lock.dependencies[1].constraint, None);

        assert_eq!(lock.cocoapods_version.as_deref(), Some("1.12.1"));
        assert_eq!(lock.podfile_checksum.as_deref(), Some("4d0c8a2b1f"));
    }

    #[test]
    fn test_dependency_forest() {
        let lock = PodfileLock::parse(LOCK);
        let forest = lock.dependency_forest(&PathBuf::from("/ios/Podfile.lock"));

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].group_id, "AFNetworking");
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].version, "2.2.1");
        assert_eq!(forest[1].children[0].group_id, "PromisesObjC");
        assert_eq!(forest[1].file_name, "GoogleUtilities/Environment-7.11.0");
        assert_eq!(
            forest[1].system_path.as_deref(),
            Some(Path::new("/ios/Podfile.lock"))
        );
    }

    #[test]
    fn test_cycles_are_cut() {
        let lock = PodfileLock::parse(
            "PODS:\n  - A (1.0):\n    - B\n  - B (1.0):\n    - A\n\nDEPENDENCIES:\n  - A\n",
        );
        let forest = lock.dependency_forest(&PathBuf::from("Podfile.lock"));

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children.len(), 1);
        assert!(forest[0].children[0].children.is_empty());
    }

    #[test]
    fn test_unknown_requirement_is_skipped() {
        let lock = PodfileLock::parse("PODS:\n  - A (1.0)\n\nDEPENDENCIES:\n  - Missing\n  - A\n");
        let forest = lock.dependency_forest(&PathBuf::from("Podfile.lock"));
        assert_eq!(forest.len(), 1);
    }
}
