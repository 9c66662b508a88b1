//! CocoaPods ecosystem support (Podfile.lock)

pub mod lockfile;

pub use lockfile::{PodEntry, PodRequirement, PodfileLock};

use crate::traits::{Collector, PackageEcosystem};
use crate::types::{CollectOutcome, Ecosystem, ManifestDescriptor};
use crate::{Error, Result};
use depscout_fs::FileSystem;
use depscout_registry::RegistryKind;
use std::path::Path;
use std::sync::Arc;

/// Lockfile name
pub const PODFILE_LOCK: &str = "Podfile.lock";

/// Reads the dependency forest straight out of `Podfile.lock`.
///
/// The lockfile is the ground truth; collection only fails when it cannot be read.
pub struct PodfileLockCollector {
    fs: Arc<dyn FileSystem>,
}

impl PodfileLockCollector {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait::async_trait]
impl Collector for PodfileLockCollector {
    fn name(&self) -> &'static str {
        "Podfile.lock"
    }

    async fn collect(&self, root: &Path) -> CollectOutcome {
        let lockfile = root.join(PODFILE_LOCK);
        match self.fs.read_to_string(&lockfile).await {
            Ok(content) => {
                CollectOutcome::success(PodfileLock::parse(&content).dependency_forest(&lockfile))
            }
            Err(e) => {
                tracing::warn!(path = %lockfile.display(), error = %e, "Couldn't read Podfile.lock");
                CollectOutcome::failure(Vec::new())
            }
        }
    }

    async fn prepare(&self, root: &Path) -> Result<()> {
        tracing::debug!(root = %root.display(), "Podfile.lock needs no preparation step");
        Ok(())
    }
}

/// The CocoaPods ecosystem
pub struct CocoaPodsEcosystem {
    collector: Box<dyn Collector>,
}

impl CocoaPodsEcosystem {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_collector(Box::new(PodfileLockCollector::new(fs)))
    }

    pub fn with_collector(collector: Box<dyn Collector>) -> Self {
        Self { collector }
    }
}

#[async_trait::async_trait]
impl PackageEcosystem for CocoaPodsEcosystem {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::CocoaPods
    }

    fn manifest_file_name(&self) -> &'static str {
        PODFILE_LOCK
    }

    fn vendor_folder(&self) -> &'static str {
        "Pods"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["h", "m", "mm", "swift"]
    }

    fn collector(&self) -> &dyn Collector {
        self.collector.as_ref()
    }

    /// The lockfile describes the project itself: named after its directory,
    /// versioned by the CocoaPods release that wrote it.
    async fn parse_manifest<F: FileSystem>(
        &self,
        fs: &Arc<F>,
        path: &Path,
    ) -> Result<ManifestDescriptor> {
        let content = fs.read_to_string(path).await?;
        let lock = PodfileLock::parse(&content);

        let name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_manifest(path, "lockfile has no parent directory"))?;
        let version = lock.cocoapods_version.clone().unwrap_or_default();
        let dependencies = lock
            .dependencies
            .iter()
            .map(|req| (req.name.clone(), req.constraint.clone().unwrap_or_default()))
            .collect();

        Ok(ManifestDescriptor {
            valid: !name.is_empty() && !version.is_empty(),
            artifact_id: name.clone(),
            name,
            version,
            checksum: lock.podfile_checksum,
            registry_locator: None,
            scoped: false,
            registry_kind: RegistryKind::Default,
            dependencies,
            path: path.to_path_buf(),
            ecosystem: Ecosystem::CocoaPods,
        })
    }

    fn ecosystem_id(&self, name: &str, _version: &str) -> String {
        name.to_string()
    }
}
