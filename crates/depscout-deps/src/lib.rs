//! # depscout-deps
//!
//! Transitive dependency resolution for npm and CocoaPods projects.
//!
//! This crate provides functionality to:
//! - Collect the dependency forest from package-manager tooling (`npm ls`,
//!   `yarn list`) or lockfiles (`Podfile.lock`)
//! - Parse manifests into descriptors carrying checksums and registry locations
//! - Enrich every node with a stable identity, querying the registry for
//!   missing checksums from a bounded worker pool
//! - Rebuild the graph from manifests alone when the tooling fails, collapsing
//!   duplicates by identity key
//!
//! ## Architecture
//!
//! - [`PackageEcosystem`] describes one ecosystem; [`Collector`] is its
//!   ground-truth source, chosen when the ecosystem is constructed
//! - [`Resolver`] drives a run and depends only on those traits
//! - Registry lookups go through `depscout-registry`
//!
//! ## Example
//!
//! ```rust,no_run
//! use depscout_deps::{NpmEcosystem, Resolver, ResolverOptions};
//! use depscout_fs::NativeFileSystem;
//! use std::collections::BTreeSet;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> depscout_deps::Result<()> {
//! let root = Path::new("/path/to/project");
//! let fs = Arc::new(NativeFileSystem::new(root)?);
//! let resolver = Resolver::new(NpmEcosystem::default(), fs, None, ResolverOptions::default());
//!
//! let manifests = BTreeSet::from([root.join("package.json")]);
//! let result = resolver.resolve(root, root, manifests).await?;
//! for dep in &result.dependencies {
//!     println!("{}@{} {}", dep.group_id, dep.version, dep.checksum);
//! }
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod cocoapods;
pub mod enrichment;
pub mod error;
pub mod exclusion;
pub mod hierarchy;
pub mod npm;
pub mod process;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export main types and traits
pub use error::{Error, Result};
pub use traits::{Collector, PackageEcosystem};
pub use types::{
    ChildRef, CollectOutcome, DependencyNode, Ecosystem, EnrichmentFailure, IdentityKey,
    ManifestDescriptor, ResolutionOutcome, ResolutionResult,
};

// Re-export ecosystems
pub use cocoapods::{CocoaPodsEcosystem, PodfileLockCollector};
pub use npm::{NpmEcosystem, NpmLsCollector, NpmOptions, YarnCollector};

// Re-export the engine
pub use enrichment::{EnrichmentPool, DEFAULT_WORKER_COUNT};
pub use hierarchy::{build_hierarchy, DedupRegistry, FlatNode, Hierarchy};
pub use resolver::{ResolutionPhase, Resolver, ResolverOptions};
