//! Concurrent enrichment of dependency nodes
//!
//! Each task reads one [`ManifestDescriptor`] and produces the identity fields
//! for one node, looking the checksum up in the registry when the manifest does
//! not carry it. Tasks share nothing mutable: results come back indexed and the
//! caller applies them after the whole pool has joined.

use crate::types::{DependencyNode, Ecosystem, EnrichmentFailure, ManifestDescriptor};
use crate::{Error, Result};
use depscout_registry::{RegistryClient, ShasumQuery};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default pool width
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Identity fields computed for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub checksum: String,
    pub system_path: PathBuf,
    pub ecosystem: Ecosystem,
}

impl Enrichment {
    /// Write the fields onto a node
    pub fn apply(&self, node: &mut DependencyNode) {
        node.group_id.clone_from(&self.group_id);
        node.artifact_id.clone_from(&self.artifact_id);
        node.version.clone_from(&self.version);
        node.checksum.clone_from(&self.checksum);
        node.file_name = self.system_path.to_string_lossy().into_owned();
        node.system_path = Some(self.system_path.clone());
        node.ecosystem = self.ecosystem;
    }

    /// A fresh node carrying these fields
    pub fn to_node(&self) -> DependencyNode {
        let mut node = DependencyNode::new(self.ecosystem, "", "", "");
        self.apply(&mut node);
        node
    }
}

/// Result of one enrichment task
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub enrichment: Enrichment,
    /// Set when the registry answered with something unusable; the
    /// enrichment then has identity fields but no checksum
    pub failure: Option<EnrichmentFailure>,
}

/// Enrich one node's fields from its descriptor.
///
/// An embedded checksum wins. Otherwise the registry is asked once when a
/// locator and a client are available. Unreachable registries yield an empty
/// checksum; malformed answers also do, and are reported as a failure.
pub async fn enrich(
    registry: Option<&RegistryClient>,
    descriptor: &ManifestDescriptor,
) -> EnrichmentOutcome {
    let mut failure = None;
    let checksum = match (&descriptor.checksum, &descriptor.registry_locator, registry) {
        (Some(checksum), _, _) if !checksum.is_empty() => checksum.clone(),
        (_, Some(locator), Some(client)) => {
            let query = ShasumQuery {
                locator: locator.clone(),
                scoped: descriptor.scoped,
                version: descriptor.version.clone(),
                kind: descriptor.registry_kind,
            };
            match client.fetch_shasum(&query).await {
                Ok(shasum) => shasum.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(
                        dependency = %descriptor.unique_dependency_name(),
                        error = %e,
                        "Unexpected registry response"
                    );
                    failure = Some(EnrichmentFailure {
                        dependency: descriptor.unique_dependency_name(),
                        manifest: descriptor.path.clone(),
                        message: e.to_string(),
                    });
                    String::new()
                }
            }
        }
        _ => String::new(),
    };

    EnrichmentOutcome {
        enrichment: Enrichment {
            group_id: descriptor.name.clone(),
            artifact_id: descriptor.artifact_id.clone(),
            version: descriptor.version.clone(),
            checksum,
            system_path: descriptor.path.clone(),
            ecosystem: descriptor.ecosystem,
        },
        failure,
    }
}

/// Fixed-width pool running enrichment tasks in parallel
#[derive(Debug, Clone)]
pub struct EnrichmentPool {
    registry: Option<RegistryClient>,
    width: usize,
}

impl EnrichmentPool {
    /// Create a pool; `registry` of `None` disables lookups
    pub fn new(registry: Option<RegistryClient>, width: usize) -> Self {
        Self {
            registry,
            width: width.max(1),
        }
    }

    /// Pool width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Run one task per descriptor and wait for all of them.
    ///
    /// Outcomes are returned in input order.
    ///
    /// # Errors
    /// Returns [`Error::Interrupted`] if any task panics or is cancelled;
    /// no partial results are returned.
    pub async fn run(&self, descriptors: Vec<Arc<ManifestDescriptor>>) -> Result<Vec<EnrichmentOutcome>> {
        let registry = self.registry.clone();
        self.run_with(descriptors, move |descriptor| {
            let registry = registry.clone();
            async move { enrich(registry.as_ref(), &descriptor).await }
        })
        .await
    }

    async fn run_with<F, Fut>(
        &self,
        descriptors: Vec<Arc<ManifestDescriptor>>,
        task: F,
    ) -> Result<Vec<EnrichmentOutcome>>
    where
        F: Fn(Arc<ManifestDescriptor>) -> Fut,
        Fut: Future<Output = EnrichmentOutcome> + Send + 'static,
    {
        let total = descriptors.len();
        let semaphore = Arc::new(Semaphore::new(self.width));
        let mut tasks = JoinSet::new();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Interrupted(e.to_string()))?;
            let work = task(descriptor);
            tasks.spawn(async move {
                let _permit = permit;
                (index, work.await)
            });
        }

        let mut slots: Vec<Option<EnrichmentOutcome>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|e| {
                tracing::error!(error = %e, "Enrichment worker interrupted");
                Error::Interrupted(e.to_string())
            })?;
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| Error::Interrupted("enrichment task lost".to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depscout_registry::RegistryKind;
    use std::collections::BTreeMap;

    fn descriptor(name: &str, checksum: Option<&str>) -> ManifestDescriptor {
        ManifestDescriptor {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            checksum: checksum.map(str::to_string),
            registry_locator: Some(format!("http://127.0.0.1:9/{name}/1.0.0")),
            scoped: false,
            registry_kind: RegistryKind::Default,
            dependencies: BTreeMap::new(),
            path: PathBuf::from(format!("/p/node_modules/{name}/package.json")),
            artifact_id: format!("{name}-1.0.0.tgz"),
            ecosystem: Ecosystem::Npm,
            valid: true,
        }
    }

    #[tokio::test]
    async fn test_embedded_checksum_wins() {
        let outcome = enrich(None, &descriptor("a", Some("abc"))).await;
        assert_eq!(outcome.enrichment.checksum, "abc");
        assert_eq!(outcome.enrichment.artifact_id, "a-1.0.0.tgz");
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn test_no_registry_leaves_checksum_empty() {
        let outcome = enrich(None, &descriptor("a", None)).await;
        assert!(outcome.enrichment.checksum.is_empty());
        assert_eq!(outcome.enrichment.group_id, "a");
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn test_pool_preserves_order() {
        let pool = EnrichmentPool::new(None, 2);
        let descriptors: Vec<_> = (0..20)
            .map(|i| Arc::new(descriptor(&format!("pkg{i}"), Some(&format!("sum{i}")))))
            .collect();

        let outcomes = pool.run(descriptors).await.unwrap();
        assert_eq!(outcomes.len(), 20);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.enrichment.checksum, format!("sum{i}"));
        }
    }

    #[tokio::test]
    async fn test_panicked_worker_interrupts_the_run() {
        let pool = EnrichmentPool::new(None, 2);
        let descriptors: Vec<_> = (0..6)
            .map(|i| Arc::new(descriptor(&format!("pkg{i}"), Some("abc"))))
            .collect();

        let result = pool
            .run_with(descriptors, |descriptor| async move {
                if descriptor.name == "pkg3" {
                    panic!("worker crashed");
                }
                enrich(None, &descriptor).await
            })
            .await;

        assert!(matches!(result, Err(Error::Interrupted(_))));
    }

    #[test]
    fn test_zero_width_is_clamped() {
        assert_eq!(EnrichmentPool::new(None, 0).width(), 1);
    }

    #[test]
    fn test_apply_sets_identity_fields() {
        let mut node = DependencyNode::new(Ecosystem::Npm, "a", "a-1.0.0.tgz", "1.0.0");
        node.children.push(DependencyNode::new(Ecosystem::Npm, "b", "b-1.0.0.tgz", "1.0.0"));
        let enrichment = Enrichment {
            group_id: "a".into(),
            artifact_id: "a-1.0.0.tgz".into(),
            version: "1.0.0".into(),
            checksum: "ff".into(),
            system_path: PathBuf::from("/p/node_modules/a/package.json"),
            ecosystem: Ecosystem::Npm,
        };
        enrichment.apply(&mut node);

        assert_eq!(node.checksum, "ff");
        assert_eq!(node.children.len(), 1);
        assert_eq!(
            node.system_path.as_deref(),
            Some(std::path::Path::new("/p/node_modules/a/package.json"))
        );
    }
}
