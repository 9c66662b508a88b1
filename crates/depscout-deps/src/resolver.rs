//! Resolution orchestrator
//!
//! Drives one resolution run for one ecosystem:
//!
//! ```text
//! COLLECTING -> LS_SUCCEEDED | LS_FAILED -> ENRICHING -> BUILDING_HIERARCHY -> DONE
//! ```
//!
//! The ground-truth collector's forest is authoritative when it succeeds; the
//! graph is rebuilt from manifest descriptors only when it fails.

use crate::enrichment::{EnrichmentOutcome, EnrichmentPool, DEFAULT_WORKER_COUNT};
use crate::exclusion::{self, is_vendored};
use crate::hierarchy::{self, DedupRegistry, FlatNode};
use crate::traits::PackageEcosystem;
use crate::types::{
    CollectOutcome, DependencyNode, EnrichmentFailure, ManifestDescriptor, ResolutionOutcome,
    ResolutionResult,
};
use crate::Result;
use depscout_fs::{DiscoveryOptions, FileSystem};
use depscout_registry::RegistryClient;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolver state, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    Collecting,
    LsSucceeded,
    LsFailed,
    Enriching,
    BuildingHierarchy,
    Done,
}

impl fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collecting => "COLLECTING",
            Self::LsSucceeded => "LS_SUCCEEDED",
            Self::LsFailed => "LS_FAILED",
            Self::Enriching => "ENRICHING",
            Self::BuildingHierarchy => "BUILDING_HIERARCHY",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Enrichment pool width
    pub worker_count: usize,
    /// Exclude all first-party source files, not only vendored copies
    pub ignore_source_files: bool,
    /// Run the collector's preparation step and rediscover manifests
    pub run_pre_step: bool,
    /// Manifest globs excluded on top of the ecosystem's own
    pub extra_manifest_excludes: Vec<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            ignore_source_files: false,
            run_pre_step: false,
            extra_manifest_excludes: Vec::new(),
        }
    }
}

/// Resolves one project for one ecosystem
pub struct Resolver<E, F> {
    ecosystem: E,
    fs: Arc<F>,
    pool: EnrichmentPool,
    options: ResolverOptions,
}

impl<E: PackageEcosystem, F: FileSystem> Resolver<E, F> {
    /// Create a resolver; a `registry` of `None` disables checksum lookups
    pub fn new(ecosystem: E, fs: Arc<F>, registry: Option<RegistryClient>, options: ResolverOptions) -> Self {
        Self {
            pool: EnrichmentPool::new(registry, options.worker_count),
            ecosystem,
            fs,
            options,
        }
    }

    pub fn ecosystem(&self) -> &E {
        &self.ecosystem
    }

    /// Manifest globs that are never resolved
    pub fn manifest_excludes(&self) -> Vec<String> {
        let mut excludes = self.ecosystem.manifest_excludes();
        excludes.extend(self.options.extra_manifest_excludes.iter().cloned());
        excludes
    }

    /// Resolve the project rooted at `top_level_folder`.
    ///
    /// `manifests` are the manifest files the surrounding scan found below it.
    /// Exclusion patterns in the result are relative to `project_folder`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Interrupted`] if the enrichment pool is
    /// interrupted, [`crate::Error::Pattern`] for a malformed exclude glob, or an
    /// I/O error if manifest rediscovery fails. Collector, manifest and
    /// registry failures degrade the result instead.
    pub async fn resolve(
        &self,
        project_folder: &Path,
        top_level_folder: &Path,
        manifests: BTreeSet<PathBuf>,
    ) -> Result<ResolutionResult> {
        let eco = self.ecosystem.ecosystem();
        let collector = self.ecosystem.collector();
        let excludes = self.manifest_excludes();
        let mut manifests = manifests;

        log_phase(ResolutionPhase::Collecting);
        if self.options.run_pre_step {
            if let Err(e) = collector.prepare(top_level_folder).await {
                tracing::warn!(root = %top_level_folder.display(), error = %e, "Preparation step failed");
            }
            let found = self
                .fs
                .find_files(
                    top_level_folder,
                    &[self.ecosystem.manifest_file_name()],
                    &excludes,
                    &DiscoveryOptions::default(),
                )
                .await?;
            manifests.extend(found);
        }

        let excluded = exclusion::compile(&excludes)?;
        let manifests: Vec<PathBuf> = manifests
            .into_iter()
            .filter(|path| !excluded.is_match(path.strip_prefix(top_level_folder).unwrap_or(path)))
            .collect();

        let descriptors = self.parse_descriptors(&self.select_per_directory(manifests)).await;
        tracing::debug!(ecosystem = %eco, count = descriptors.len(), "Parsed manifests");

        let (forest, succeeded) = self.collect_modules(top_level_folder, &descriptors).await;

        let (dependencies, outcome, failures) = if succeeded {
            log_phase(ResolutionPhase::LsSucceeded);
            if forest.is_empty() {
                (Vec::new(), ResolutionOutcome::ZeroDependencies, Vec::new())
            } else {
                let (dependencies, failures) = self.enrich_forest(forest, &descriptors).await?;
                (dependencies, ResolutionOutcome::Resolved, failures)
            }
        } else {
            log_phase(ResolutionPhase::LsFailed);
            let (dependencies, failures) = self.from_manifests(top_level_folder, descriptors).await?;
            (dependencies, ResolutionOutcome::ManifestFallback, failures)
        };

        let exclude_patterns = if !dependencies.is_empty() || outcome == ResolutionOutcome::ZeroDependencies {
            exclusion::source_excludes(
                project_folder,
                top_level_folder,
                self.ecosystem.vendor_folder(),
                self.ecosystem.source_extensions(),
                self.options.ignore_source_files,
            )
        } else {
            Vec::new()
        };

        log_phase(ResolutionPhase::Done);
        Ok(ResolutionResult {
            dependencies,
            exclude_patterns,
            ecosystem: eco,
            project_root: top_level_folder.to_path_buf(),
            outcome,
            failures,
        })
    }

    /// One manifest per directory: the canonical file name if present,
    /// otherwise the first in path order.
    fn select_per_directory(&self, manifests: Vec<PathBuf>) -> Vec<PathBuf> {
        let canonical = self.ecosystem.manifest_file_name();
        let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for path in manifests {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            by_dir.entry(dir).or_default().push(path);
        }

        by_dir
            .into_values()
            .filter_map(|files| {
                let preferred = files
                    .iter()
                    .position(|p| p.file_name().is_some_and(|n| n == canonical))
                    .unwrap_or(0);
                files.into_iter().nth(preferred)
            })
            .collect()
    }

    async fn parse_descriptors(&self, manifests: &[PathBuf]) -> Vec<ManifestDescriptor> {
        let mut descriptors = Vec::with_capacity(manifests.len());
        for path in manifests {
            match self.ecosystem.parse_manifest(&self.fs, path).await {
                Ok(descriptor) if descriptor.valid => descriptors.push(descriptor),
                Ok(_) => tracing::debug!(path = %path.display(), "Skipping invalid manifest"),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping unparsable manifest"),
            }
        }
        descriptors
    }

    /// Collect at the top folder and at every other non-vendored module.
    ///
    /// Each module's nodes are stamped with that module's manifest. The run
    /// succeeds only if every collection succeeded.
    async fn collect_modules(
        &self,
        top_level_folder: &Path,
        descriptors: &[ManifestDescriptor],
    ) -> (Vec<DependencyNode>, bool) {
        let vendor = self.ecosystem.vendor_folder();
        let mut roots = vec![top_level_folder.to_path_buf()];
        let mut visited: HashSet<PathBuf> = roots.iter().cloned().collect();
        for descriptor in descriptors {
            let Some(dir) = descriptor.path.parent() else {
                continue;
            };
            if is_vendored(top_level_folder, dir, vendor) || !visited.insert(dir.to_path_buf()) {
                continue;
            }
            roots.push(dir.to_path_buf());
        }

        let collector = self.ecosystem.collector();
        let mut forest = Vec::new();
        let mut succeeded = true;
        for root in roots {
            let CollectOutcome {
                mut dependencies,
                succeeded: ok,
            } = collector.collect(&root).await;
            tracing::debug!(
                collector = collector.name(),
                root = %root.display(),
                succeeded = ok,
                count = dependencies.len(),
                "Collected module"
            );
            let manifest = root.join(self.ecosystem.manifest_file_name());
            for node in &mut dependencies {
                node.walk_mut(&mut |n| n.dependency_file = Some(manifest.clone()));
            }
            succeeded &= ok;
            forest.extend(dependencies);
        }
        (forest, succeeded)
    }

    /// Ground-truth path: complete identities of the collected forest.
    ///
    /// Nodes are matched to descriptors by `name@version`. Unmatched nodes keep
    /// what the collector gave them and stay in the forest.
    async fn enrich_forest(
        &self,
        mut forest: Vec<DependencyNode>,
        descriptors: &[ManifestDescriptor],
    ) -> Result<(Vec<DependencyNode>, Vec<EnrichmentFailure>)> {
        let index = descriptor_index(descriptors);

        // One slot per node in preorder
        let mut slots: Vec<Option<usize>> = Vec::new();
        let mut tasks: Vec<Arc<ManifestDescriptor>> = Vec::new();
        for root in &forest {
            root.walk(&mut |node| match index.get(&node.unique_dependency_name()) {
                Some(descriptor) => {
                    slots.push(Some(tasks.len()));
                    tasks.push(Arc::clone(descriptor));
                }
                None => {
                    if node.checksum.is_empty() {
                        tracing::debug!(
                            dependency = %node.unique_dependency_name(),
                            "No manifest found for dependency"
                        );
                    }
                    slots.push(None);
                }
            });
        }

        log_phase(ResolutionPhase::Enriching);
        let outcomes = self.pool.run(tasks).await?;

        let mut position = 0;
        for root in &mut forest {
            root.walk_mut(&mut |node| {
                if let Some(Some(task)) = slots.get(position) {
                    outcomes[*task].enrichment.apply(node);
                }
                position += 1;
            });
        }

        let mut registry = DedupRegistry::new();
        let forest = hierarchy::dedup_forest(forest, &mut registry);
        Ok((forest, collect_failures(outcomes)))
    }

    /// Fallback path: one node per descriptor, edges rebuilt from declared
    /// dependencies.
    async fn from_manifests(
        &self,
        top_level_folder: &Path,
        descriptors: Vec<ManifestDescriptor>,
    ) -> Result<(Vec<DependencyNode>, Vec<EnrichmentFailure>)> {
        let vendor = self.ecosystem.vendor_folder();
        let descriptors: Vec<Arc<ManifestDescriptor>> = descriptors.into_iter().map(Arc::new).collect();

        log_phase(ResolutionPhase::Enriching);
        let outcomes = self.pool.run(descriptors.clone()).await?;

        let nodes: Vec<FlatNode> = descriptors
            .iter()
            .zip(&outcomes)
            .map(|(descriptor, outcome)| {
                let mut node = outcome.enrichment.to_node();
                node.declared_children = descriptor.declared_children();
                FlatNode {
                    node,
                    vendored: is_vendored(top_level_folder, &descriptor.path, vendor),
                }
            })
            .collect();

        log_phase(ResolutionPhase::BuildingHierarchy);
        let hierarchy = hierarchy::build_hierarchy(&self.ecosystem, nodes);
        tracing::debug!(unique = hierarchy.registry.len(), "Hierarchy built");
        Ok((hierarchy.roots, collect_failures(outcomes)))
    }
}

/// Descriptors keyed by `name@version`.
///
/// Descriptors are taken distinct by package name and artifact id, then the
/// first one per `name@version` is kept.
fn descriptor_index(descriptors: &[ManifestDescriptor]) -> HashMap<String, Arc<ManifestDescriptor>> {
    let mut seen_artifacts = HashSet::new();
    let mut index = HashMap::new();
    for descriptor in descriptors {
        if !seen_artifacts.insert((descriptor.name.as_str(), descriptor.artifact_id.as_str())) {
            continue;
        }
        index
            .entry(descriptor.unique_dependency_name())
            .or_insert_with(|| Arc::new(descriptor.clone()));
    }
    index
}

fn collect_failures(outcomes: Vec<EnrichmentOutcome>) -> Vec<EnrichmentFailure> {
    outcomes.into_iter().filter_map(|o| o.failure).collect()
}

fn log_phase(phase: ResolutionPhase) {
    tracing::debug!(phase = %phase, "Resolution phase");
}
