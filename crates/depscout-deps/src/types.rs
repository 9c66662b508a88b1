//! Core types for dependency resolution

use depscout_registry::RegistryKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Package ecosystem a dependency belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// npm / yarn (`package.json`)
    Npm,
    /// CocoaPods (`Podfile.lock`)
    CocoaPods,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::CocoaPods => write!(f, "cocoapods"),
        }
    }
}

/// Deduplication key: checksum, version and artifact id concatenated.
///
/// Two nodes with the same key are the same logical dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Build a key from its three parts
    pub fn new(checksum: &str, version: &str, artifact_id: &str) -> Self {
        Self(format!("{checksum}{version}{artifact_id}"))
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A declared, not yet resolved, child reference: package name and version range
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChildRef {
    /// Package name
    pub name: String,
    /// Version or version range as declared
    pub version: String,
}

/// One resolved node in the dependency forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    /// Package name
    pub group_id: String,
    /// Ecosystem-specific artifact id (`name-1.0.0.tgz` for npm)
    pub artifact_id: String,
    /// Resolved version
    pub version: String,
    /// Content checksum; empty until enriched or when no source knows it
    pub checksum: String,
    /// Artifact file name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub file_name: String,
    /// File the node's identity was read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_path: Option<PathBuf>,
    /// Project manifest the node is attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_file: Option<PathBuf>,
    /// Ecosystem tag
    pub ecosystem: Ecosystem,
    /// Declared child references before hierarchy building
    #[serde(skip)]
    pub declared_children: Vec<ChildRef>,
    /// Resolved children
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Create a node with identity fields only
    pub fn new(
        ecosystem: Ecosystem,
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            checksum: String::new(),
            file_name: String::new(),
            system_path: None,
            dependency_file: None,
            ecosystem,
            declared_children: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The node's deduplication key
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.checksum, &self.version, &self.artifact_id)
    }

    /// `name@version`, the key used to match nodes to manifest descriptors
    pub fn unique_dependency_name(&self) -> String {
        unique_dependency_name(&self.group_id, &self.version)
    }

    /// Total number of nodes in this subtree, this node included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(DependencyNode::count).sum::<usize>()
    }

    /// Visit this node and its descendants in preorder
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DependencyNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Visit this node and its descendants in preorder, mutably
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut DependencyNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }
}

/// `name@version`
pub fn unique_dependency_name(name: &str, version: &str) -> String {
    format!("{name}@{version}")
}

/// Parsed representation of one ecosystem manifest (a "BOM file")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDescriptor {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Checksum embedded in the manifest, if any
    pub checksum: Option<String>,
    /// Registry URL of the package document; may contain the scope placeholder
    pub registry_locator: Option<String>,
    /// Whether the name carries a namespace prefix
    pub scoped: bool,
    /// Which authorization scheme the registry expects
    pub registry_kind: RegistryKind,
    /// Declared dependencies: name to version range
    pub dependencies: BTreeMap<String, String>,
    /// Local manifest path
    pub path: PathBuf,
    /// Ecosystem-specific artifact id
    pub artifact_id: String,
    /// Ecosystem tag
    pub ecosystem: Ecosystem,
    /// `false` excludes the descriptor from all further processing
    pub valid: bool,
}

impl ManifestDescriptor {
    /// `name@version`
    pub fn unique_dependency_name(&self) -> String {
        unique_dependency_name(&self.name, &self.version)
    }

    /// Declared dependencies as child references, in name order
    pub fn declared_children(&self) -> Vec<ChildRef> {
        self.dependencies
            .iter()
            .map(|(name, version)| ChildRef {
                name: name.clone(),
                version: version.clone(),
            })
            .collect()
    }
}

/// What a collector produced for one root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectOutcome {
    /// Dependency forest; may be partial when `succeeded` is false
    pub dependencies: Vec<DependencyNode>,
    /// Whether the ground-truth tool ran to completion.
    ///
    /// Independent of emptiness: a successful run with no dependencies means
    /// the project has none.
    pub succeeded: bool,
}

impl CollectOutcome {
    /// A completed collection
    pub fn success(dependencies: Vec<DependencyNode>) -> Self {
        Self {
            dependencies,
            succeeded: true,
        }
    }

    /// A failed collection, keeping whatever partial data was parsed
    pub fn failure(dependencies: Vec<DependencyNode>) -> Self {
        Self {
            dependencies,
            succeeded: false,
        }
    }
}

/// Which branch a resolution took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionOutcome {
    /// The ground-truth tool succeeded and found dependencies
    Resolved,
    /// The ground-truth tool succeeded and found none
    ZeroDependencies,
    /// The ground-truth tool failed; the graph was rebuilt from manifests
    ManifestFallback,
}

/// An enrichment task whose registry answer could not be used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentFailure {
    /// `name@version`
    pub dependency: String,
    /// Manifest the task was built from
    pub manifest: PathBuf,
    /// Error description
    pub message: String,
}

/// Output of one resolver run
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    /// Dependency forest with parent/child edges
    pub dependencies: Vec<DependencyNode>,
    /// Source-file glob patterns a parallel scan should skip
    pub exclude_patterns: Vec<String>,
    /// Ecosystem tag
    pub ecosystem: Ecosystem,
    /// Top-level folder that was resolved
    pub project_root: PathBuf,
    /// Which branch produced the forest
    pub outcome: ResolutionOutcome,
    /// Enrichment tasks that ended with a malformed registry response
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<EnrichmentFailure>,
}

impl ResolutionResult {
    /// Number of nodes across the whole forest
    pub fn node_count(&self) -> usize {
        self.dependencies.iter().map(DependencyNode::count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_concatenates() {
        let mut node = DependencyNode::new(Ecosystem::Npm, "a", "a-1.0.0.tgz", "1.0.0");
        node.checksum = "abc".to_string();
        assert_eq!(node.identity_key().as_str(), "abc1.0.0a-1.0.0.tgz");
    }

    #[test]
    fn test_unique_dependency_name() {
        let node = DependencyNode::new(Ecosystem::Npm, "@types/node", "node-20.1.0.tgz", "20.1.0");
        assert_eq!(node.unique_dependency_name(), "@types/node@20.1.0");
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut root = DependencyNode::new(Ecosystem::Npm, "root", "root", "1");
        let mut a = DependencyNode::new(Ecosystem::Npm, "a", "a", "1");
        a.children.push(DependencyNode::new(Ecosystem::Npm, "a1", "a1", "1"));
        root.children.push(a);
        root.children.push(DependencyNode::new(Ecosystem::Npm, "b", "b", "1"));

        let mut names = Vec::new();
        root.walk(&mut |n| names.push(n.group_id.clone()));
        assert_eq!(names, ["root", "a", "a1", "b"]);
        assert_eq!(root.count(), 4);
    }

    #[test]
    fn test_collect_outcome_success_is_independent_of_emptiness() {
        let empty = CollectOutcome::success(vec![]);
        assert!(empty.succeeded);
        assert!(empty.dependencies.is_empty());
        assert!(!CollectOutcome::failure(vec![]).succeeded);
    }
}
