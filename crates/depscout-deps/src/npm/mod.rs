//! npm ecosystem support (package.json, `npm ls`, `yarn list`)

pub mod ls;
pub mod manifest;
pub mod yarn;

pub use ls::NpmLsCollector;
pub use manifest::parse_package_json;
pub use yarn::YarnCollector;

use crate::traits::{Collector, PackageEcosystem};
use crate::types::{DependencyNode, Ecosystem, ManifestDescriptor};
use crate::Result;
use depscout_fs::FileSystem;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Registry used for packages that do not record where they were resolved from
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Settings shared by the npm collectors
#[derive(Debug, Clone)]
pub struct NpmOptions {
    /// Include devDependencies in the ground-truth listing
    pub include_dev_dependencies: bool,
    /// Timeout for `npm ls` / `yarn list`
    pub ls_timeout: Duration,
    /// Timeout for the install preparation step
    pub install_timeout: Duration,
    /// Accept a non-zero `npm ls` exit when its JSON still parsed
    pub ignore_ls_errors: bool,
    /// Pass `--ignore-scripts` to the install preparation step
    pub ignore_scripts: bool,
    /// Collect with `yarn list` instead of `npm ls`
    pub yarn: bool,
    /// Registry for packages without an `_resolved` URL
    pub default_registry: String,
}

impl Default for NpmOptions {
    fn default() -> Self {
        Self {
            include_dev_dependencies: false,
            ls_timeout: Duration::from_secs(60),
            install_timeout: Duration::from_secs(600),
            ignore_ls_errors: false,
            ignore_scripts: false,
            yarn: false,
            default_registry: DEFAULT_REGISTRY.to_string(),
        }
    }
}

/// npm artifact id: the tarball name, `name-version.tgz`.
///
/// Scoped packages drop their scope, as npm does for tarballs.
pub fn npm_artifact_id(name: &str, version: &str) -> String {
    let bare = name.rsplit('/').next().unwrap_or(name);
    format!("{bare}-{version}.tgz")
}

pub(crate) fn npm_node(name: &str, version: &str) -> DependencyNode {
    let artifact_id = npm_artifact_id(name, version);
    let mut node = DependencyNode::new(Ecosystem::Npm, name, artifact_id.clone(), version);
    node.file_name = artifact_id;
    node
}

/// The npm ecosystem
pub struct NpmEcosystem {
    collector: Box<dyn Collector>,
    default_registry: String,
}

impl NpmEcosystem {
    /// Create the ecosystem, choosing `yarn list` or `npm ls` from the options
    pub fn new(options: NpmOptions) -> Self {
        let default_registry = options.default_registry.clone();
        let collector: Box<dyn Collector> = if options.yarn {
            Box::new(YarnCollector::new(options))
        } else {
            Box::new(NpmLsCollector::new(options))
        };
        Self {
            collector,
            default_registry,
        }
    }

    /// Create the ecosystem around a specific collector
    pub fn with_collector(collector: Box<dyn Collector>, default_registry: impl Into<String>) -> Self {
        Self {
            collector,
            default_registry: default_registry.into(),
        }
    }
}

impl Default for NpmEcosystem {
    fn default() -> Self {
        Self::new(NpmOptions::default())
    }
}

#[async_trait::async_trait]
impl PackageEcosystem for NpmEcosystem {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn manifest_file_name(&self) -> &'static str {
        "package.json"
    }

    fn vendor_folder(&self) -> &'static str {
        "node_modules"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["js", "ts", "tsx"]
    }

    fn collector(&self) -> &dyn Collector {
        self.collector.as_ref()
    }

    async fn parse_manifest<F: FileSystem>(
        &self,
        fs: &Arc<F>,
        path: &Path,
    ) -> Result<ManifestDescriptor> {
        let content = fs.read_to_string(path).await?;
        parse_package_json(&content, path, &self.default_registry)
    }

    fn ecosystem_id(&self, name: &str, version: &str) -> String {
        npm_artifact_id(name, version)
    }

    /// Tarball names drop the scope, so the full package name must match too
    fn matches_child(&self, node: &DependencyNode, name: &str, version: &str) -> bool {
        node.group_id == name && node.artifact_id == npm_artifact_id(name, version)
    }

    fn satisfies_child(&self, node: &DependencyNode, name: &str, range: &str) -> bool {
        if node.group_id != name {
            return false;
        }
        match (
            node_semver::Range::parse(range),
            node_semver::Version::parse(&node.version),
        ) {
            (Ok(range), Ok(version)) => range.satisfies(&version),
            _ => false,
        }
    }
}
