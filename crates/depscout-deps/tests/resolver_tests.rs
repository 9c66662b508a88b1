//! End-to-end resolver tests
//!
//! Collectors are scripted in-process and manifests live in the in-memory file
//! system, so nothing here shells out to a package manager.

use depscout_deps::{
    checksum::cocoapods_checksum, CocoaPodsEcosystem, CollectOutcome, Collector, DependencyNode,
    Ecosystem, Error, NpmEcosystem, ResolutionOutcome, Resolver, ResolverOptions, Result,
};
use depscout_fs::MemoryFileSystem;
use depscout_registry::{RegistryClient, RegistryClientConfig};
use httpmock::prelude::*;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Collector returning canned outcomes per root; unknown roots fail.
#[derive(Default)]
struct ScriptedCollector {
    outcomes: HashMap<PathBuf, CollectOutcome>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
    prepared: Arc<Mutex<bool>>,
    fail_prepare: bool,
}

impl ScriptedCollector {
    fn with(mut self, root: &str, outcome: CollectOutcome) -> Self {
        self.outcomes.insert(PathBuf::from(root), outcome);
        self
    }
}

#[async_trait::async_trait]
impl Collector for ScriptedCollector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn collect(&self, root: &Path) -> CollectOutcome {
        self.calls.lock().unwrap().push(root.to_path_buf());
        self.outcomes
            .get(root)
            .cloned()
            .unwrap_or_else(|| CollectOutcome::failure(Vec::new()))
    }

    async fn prepare(&self, _root: &Path) -> Result<()> {
        *self.prepared.lock().unwrap() = true;
        if self.fail_prepare {
            Err(Error::Other("install failed".to_string()))
        } else {
            Ok(())
        }
    }
}

fn npm_node(name: &str, version: &str, children: Vec<DependencyNode>) -> DependencyNode {
    let mut node = DependencyNode::new(
        Ecosystem::Npm,
        name,
        format!("{name}-{version}.tgz"),
        version,
    );
    node.children = children;
    node
}

/// Every manifest of [`node_project`], as a file scan would report them
fn manifests() -> BTreeSet<PathBuf> {
    [
        "/app/package.json",
        "/app/node_modules/a/package.json",
        "/app/node_modules/b/package.json",
        "/app/node_modules/shared/package.json",
        "/app/node_modules/orphan/package.json",
        "/app/examples/demo/package.json",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn node_project() -> MemoryFileSystem {
    MemoryFileSystem::new(
        "/app",
        [
            (
                "package.json",
                r#"{"name": "app", "version": "1.0.0", "private": true,
                    "dependencies": {"a": "^1.0.0", "b": "^1.0.0"}}"#,
            ),
            (
                "node_modules/a/package.json",
                r#"{"name": "a", "version": "1.1.0", "_shasum": "aaa",
                    "dependencies": {"shared": "^2.0.0"}}"#,
            ),
            (
                "node_modules/b/package.json",
                r#"{"name": "b", "version": "1.0.0", "_shasum": "bbb",
                    "dependencies": {"shared": "2.x"}}"#,
            ),
            (
                "node_modules/shared/package.json",
                r#"{"name": "shared", "version": "2.3.0", "_shasum": "sss"}"#,
            ),
            (
                "node_modules/orphan/package.json",
                r#"{"name": "orphan", "version": "0.1.0", "_shasum": "ooo"}"#,
            ),
            (
                "examples/demo/package.json",
                r#"{"name": "demo", "version": "0.0.1"}"#,
            ),
        ],
    )
    .unwrap()
}

fn resolver(
    collector: ScriptedCollector,
    fs: MemoryFileSystem,
    registry: Option<RegistryClient>,
    options: ResolverOptions,
) -> Resolver<NpmEcosystem, MemoryFileSystem> {
    let eco = NpmEcosystem::with_collector(Box::new(collector), "https://registry.npmjs.org");
    Resolver::new(eco, Arc::new(fs), registry, options)
}

fn count_named(roots: &[DependencyNode], name: &str) -> usize {
    let mut count = 0;
    for root in roots {
        root.walk(&mut |n| {
            if n.group_id == name {
                count += 1;
            }
        });
    }
    count
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_collection_falls_back_to_manifests() {
    let fs = node_project();
    let found = manifests();
    let resolver = resolver(ScriptedCollector::default(), fs, None, ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/app"), Path::new("/app"), found)
        .await
        .unwrap();

    assert_eq!(result.outcome, ResolutionOutcome::ManifestFallback);
    assert_eq!(result.dependencies.len(), 1);

    let app = &result.dependencies[0];
    assert_eq!(app.group_id, "app");
    let children: Vec<_> = app.children.iter().map(|c| c.group_id.as_str()).collect();
    assert_eq!(children, ["a", "b"]);
    assert_eq!(app.children[0].checksum, "aaa");

    // The diamond on `shared` is attached once, and the orphan never becomes a root
    assert_eq!(count_named(&result.dependencies, "shared"), 1);
    assert_eq!(count_named(&result.dependencies, "orphan"), 0);
    assert_eq!(count_named(&result.dependencies, "demo"), 0);

    assert_eq!(
        result.exclude_patterns,
        ["node_modules/**/*.js", "node_modules/**/*.ts", "node_modules/**/*.tsx"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_empty_collection_is_not_a_failure() {
    let fs = node_project();
    let found = manifests();
    let collector = ScriptedCollector::default().with("/app", CollectOutcome::success(Vec::new()));
    let resolver = resolver(collector, fs, None, ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/app"), Path::new("/app"), found)
        .await
        .unwrap();

    assert_eq!(result.outcome, ResolutionOutcome::ZeroDependencies);
    assert!(result.dependencies.is_empty());
    assert!(!result.exclude_patterns.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ground_truth_forest_is_enriched_and_unmatched_nodes_kept() {
    let fs = node_project();
    let found = manifests();
    let forest = vec![npm_node(
        "a",
        "1.1.0",
        vec![npm_node("unlisted", "9.9.9", vec![])],
    )];
    let collector = ScriptedCollector::default().with("/app", CollectOutcome::success(forest));
    let resolver = resolver(collector, fs, None, ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/app"), Path::new("/app"), found)
        .await
        .unwrap();

    assert_eq!(result.outcome, ResolutionOutcome::Resolved);
    let a = &result.dependencies[0];
    assert_eq!(a.checksum, "aaa");
    assert_eq!(
        a.system_path.as_deref(),
        Some(Path::new("/app/node_modules/a/package.json"))
    );
    assert_eq!(a.dependency_file.as_deref(), Some(Path::new("/app/package.json")));

    let unlisted = &a.children[0];
    assert_eq!(unlisted.group_id, "unlisted");
    assert_eq!(unlisted.artifact_id, "unlisted-9.9.9.tgz");
    assert!(unlisted.checksum.is_empty());
    assert_eq!(unlisted.dependency_file.as_deref(), Some(Path::new("/app/package.json")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_ground_truth_nodes_are_collapsed() {
    let fs = node_project();
    let found = manifests();
    let forest = vec![
        npm_node("a", "1.1.0", vec![npm_node("shared", "2.3.0", vec![])]),
        npm_node("b", "1.0.0", vec![npm_node("shared", "2.3.0", vec![])]),
    ];
    let collector = ScriptedCollector::default().with("/app", CollectOutcome::success(forest));
    let resolver = resolver(collector, fs, None, ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/app"), Path::new("/app"), found)
        .await
        .unwrap();

    assert_eq!(count_named(&result.dependencies, "shared"), 1);
    assert_eq!(result.node_count(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_modules_are_collected_and_any_failure_triggers_fallback() {
    let fs = MemoryFileSystem::new(
        "/repo",
        [
            ("package.json", r#"{"name": "root", "version": "1.0.0"}"#),
            ("web/package.json", r#"{"name": "web", "version": "1.0.0"}"#),
        ],
    )
    .unwrap();
    let found = BTreeSet::from([
        PathBuf::from("/repo/package.json"),
        PathBuf::from("/repo/web/package.json"),
    ]);

    let collector = ScriptedCollector::default()
        .with("/repo", CollectOutcome::success(vec![npm_node("x", "1.0.0", vec![])]))
        .with("/repo/web", CollectOutcome::failure(vec![npm_node("y", "1.0.0", vec![])]));
    let calls = collector.calls.clone();
    let resolver = resolver(collector, fs, None, ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/repo"), Path::new("/repo"), found)
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        [PathBuf::from("/repo"), PathBuf::from("/repo/web")]
    );
    assert_eq!(result.outcome, ResolutionOutcome::ManifestFallback);
    let roots: BTreeSet<_> = result.dependencies.iter().map(|d| d.group_id.as_str()).collect();
    assert_eq!(roots, BTreeSet::from(["root", "web"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_module_forests_are_unioned_with_their_manifest() {
    let fs = MemoryFileSystem::new(
        "/repo",
        [
            ("package.json", r#"{"name": "root", "version": "1.0.0"}"#),
            ("web/package.json", r#"{"name": "web", "version": "1.0.0"}"#),
        ],
    )
    .unwrap();
    let found = BTreeSet::from([
        PathBuf::from("/repo/package.json"),
        PathBuf::from("/repo/web/package.json"),
    ]);
    let collector = ScriptedCollector::default()
        .with("/repo", CollectOutcome::success(vec![npm_node("x", "1.0.0", vec![])]))
        .with("/repo/web", CollectOutcome::success(vec![npm_node("y", "1.0.0", vec![])]));
    let resolver = resolver(collector, fs, None, ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/repo"), Path::new("/repo"), found)
        .await
        .unwrap();

    assert_eq!(result.outcome, ResolutionOutcome::Resolved);
    assert_eq!(result.dependencies.len(), 2);
    assert_eq!(
        result.dependencies[1].dependency_file.as_deref(),
        Some(Path::new("/repo/web/package.json"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_preparation_failure_is_recorded_and_manifests_rediscovered() {
    let fs = node_project();
    let collector = ScriptedCollector {
        fail_prepare: true,
        ..ScriptedCollector::default()
    };
    let prepared = collector.prepared.clone();
    let options = ResolverOptions {
        run_pre_step: true,
        ignore_source_files: true,
        ..ResolverOptions::default()
    };
    let resolver = resolver(collector, fs, None, options);

    let result = resolver
        .resolve(Path::new("/"), Path::new("/app"), BTreeSet::new())
        .await
        .unwrap();

    assert!(*prepared.lock().unwrap());
    assert_eq!(result.outcome, ResolutionOutcome::ManifestFallback);
    assert_eq!(result.dependencies[0].group_id, "app");
    assert_eq!(result.exclude_patterns[0], "app/**/*.js");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_registry_response_is_reported_and_node_kept() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/odd/1.0.0");
            then.status(200).json_body(json!({"name": "odd", "dist": {}}));
        })
        .await;

    let fs = MemoryFileSystem::new(
        "/app",
        [
            (
                "package.json".to_string(),
                r#"{"name": "app", "version": "1.0.0", "private": true, "dependencies": {"odd": "1.0.0"}}"#
                    .to_string(),
            ),
            (
                "node_modules/odd/package.json".to_string(),
                json!({
                    "name": "odd",
                    "version": "1.0.0",
                    "_resolved": format!("{}/odd/-/odd-1.0.0.tgz", server.base_url()),
                })
                .to_string(),
            ),
        ],
    )
    .unwrap();
    let found = BTreeSet::from([
        PathBuf::from("/app/package.json"),
        PathBuf::from("/app/node_modules/odd/package.json"),
    ]);
    let registry = RegistryClient::new(RegistryClientConfig::default()).unwrap();
    let resolver = resolver(ScriptedCollector::default(), fs, Some(registry), ResolverOptions::default());

    let result = resolver
        .resolve(Path::new("/app"), Path::new("/app"), found)
        .await
        .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].dependency, "odd@1.0.0");

    let odd = &result.dependencies[0].children[0];
    assert_eq!(odd.group_id, "odd");
    assert_eq!(odd.artifact_id, "odd-1.0.0.tgz");
    assert!(odd.checksum.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_podfile_lock_forest() {
    let lock = "PODS:\n  - Bar (2.0)\n  - Foo (1.0):\n    - Bar (= 2.0)\n\nDEPENDENCIES:\n  - Foo (= 1.0)\n\nCOCOAPODS: 1.14.3\n";
    let fs = Arc::new(MemoryFileSystem::new("/app", [("ios/Podfile.lock", lock)]).unwrap());
    let resolver = Resolver::new(
        CocoaPodsEcosystem::new(fs.clone()),
        fs,
        None,
        ResolverOptions::default(),
    );

    let result = resolver
        .resolve(
            Path::new("/app"),
            Path::new("/app/ios"),
            BTreeSet::from([PathBuf::from("/app/ios/Podfile.lock")]),
        )
        .await
        .unwrap();

    assert_eq!(result.outcome, ResolutionOutcome::Resolved);
    assert_eq!(result.ecosystem, Ecosystem::CocoaPods);
    assert_eq!(result.dependencies.len(), 1);

    let foo = &result.dependencies[0];
    assert_eq!((foo.group_id.as_str(), foo.version.as_str()), ("Foo", "1.0"));
    assert_eq!(foo.children.len(), 1);

    let bar = &foo.children[0];
    assert_eq!((bar.group_id.as_str(), bar.version.as_str()), ("Bar", "2.0"));
    assert_eq!(bar.checksum, cocoapods_checksum("Bar", "2.0"));
    assert_eq!(bar.checksum, "551123000aeb98e5052984a25ddad4f348841d56");

    assert_eq!(
        result.exclude_patterns,
        ["ios/Pods/**/*.h", "ios/Pods/**/*.m", "ios/Pods/**/*.mm", "ios/Pods/**/*.swift"]
    );
}
