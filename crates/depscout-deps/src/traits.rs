//! Core traits for dependency resolution

use crate::types::{CollectOutcome, DependencyNode, Ecosystem, ManifestDescriptor};
use crate::Result;
use depscout_fs::FileSystem;
use std::path::Path;
use std::sync::Arc;

/// Directories whose manifests are never resolved (fixtures, samples, bower output)
pub const EXCLUDED_MANIFEST_DIRS: &[&str] = &["example", "examples", "test", ".ws_bower"];

/// Turns ecosystem tooling output into a dependency forest.
///
/// Implementations run an external inspection command or read a lockfile.
/// Failures are reported through [`CollectOutcome::succeeded`], never as
/// errors, so the resolver can fall back to manifests.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs (`npm ls`, `yarn list`, ...)
    fn name(&self) -> &'static str;

    /// Collect the dependency forest of the project rooted at `root`
    async fn collect(&self, root: &Path) -> CollectOutcome;

    /// Run the one-time preparation step (e.g. installing declared packages)
    ///
    /// # Errors
    /// Returns an error if the step could not run; callers record it and continue
    async fn prepare(&self, root: &Path) -> Result<()>;
}

/// Capabilities the resolver needs from one ecosystem
#[async_trait::async_trait]
pub trait PackageEcosystem: Send + Sync {
    /// Ecosystem tag
    fn ecosystem(&self) -> Ecosystem;

    /// Canonical manifest file name (`package.json`, `Podfile.lock`)
    fn manifest_file_name(&self) -> &'static str;

    /// Folder holding installed transitive dependencies
    fn vendor_folder(&self) -> &'static str;

    /// Extensions of first-party source files this ecosystem covers
    fn source_extensions(&self) -> &'static [&'static str];

    /// Glob patterns for manifests that are never resolved
    fn manifest_excludes(&self) -> Vec<String> {
        EXCLUDED_MANIFEST_DIRS
            .iter()
            .map(|dir| format!("**/{dir}/**/{}", self.manifest_file_name()))
            .collect()
    }

    /// The collector chosen for this ecosystem at construction time
    fn collector(&self) -> &dyn Collector;

    /// Parse one manifest file into a descriptor
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a manifest
    async fn parse_manifest<F: FileSystem>(
        &self,
        fs: &Arc<F>,
        path: &Path,
    ) -> Result<ManifestDescriptor>;

    /// Ecosystem-specific artifact id for a name and version
    fn ecosystem_id(&self, name: &str, version: &str) -> String;

    /// Whether `node` is the exact artifact a declared child names
    fn matches_child(&self, node: &DependencyNode, name: &str, version: &str) -> bool {
        node.artifact_id == self.ecosystem_id(name, version)
    }

    /// Looser match tried when no node matches exactly (e.g. version ranges)
    fn satisfies_child(&self, _node: &DependencyNode, _name: &str, _range: &str) -> bool {
        false
    }
}
