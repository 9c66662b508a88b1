//! Hierarchy reconstruction and deduplication by identity key

use crate::traits::PackageEcosystem;
use crate::types::{DependencyNode, IdentityKey};
use std::collections::{BTreeSet, VecDeque};

/// Set of identity keys already placed in a graph.
///
/// The first registration of a key wins; later ones are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupRegistry {
    keys: BTreeSet<IdentityKey>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; returns `false` if it was already present
    pub fn register(&mut self, key: IdentityKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.keys.iter()
    }
}

/// A flat, enriched node waiting for edges
#[derive(Debug, Clone)]
pub struct FlatNode {
    /// The node; its `declared_children` drive edge reconstruction
    pub node: DependencyNode,
    /// Whether the node's manifest lives inside the vendored-dependency folder.
    /// Vendored nodes may become children but never roots.
    pub vendored: bool,
}

/// Output of [`build_hierarchy`]
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub roots: Vec<DependencyNode>,
    /// Every key present in `roots` and their descendants
    pub registry: DedupRegistry,
}

/// Rebuild parent/child edges among flat nodes from their declared children.
///
/// Nodes are first collapsed by identity key (first occurrence wins). Edges
/// are then assigned breadth-first, starting from the non-vendored nodes in
/// input order. Every declared child `(name, range)` is looked up: an exact
/// [`PackageEcosystem::matches_child`] hit first, else the first node passing
/// [`PackageEcosystem::satisfies_child`]. A match is attached only if its key
/// has not been attached anywhere yet, it is not the parent itself, and it is
/// not an ancestor of the parent. A key therefore appears at most once in the
/// result even when several parents declare it.
///
/// Roots are the non-vendored nodes left without a parent. Vendored nodes no
/// non-vendored node reaches are dropped, so they never claim a child the
/// project itself depends on.
pub fn build_hierarchy<E: PackageEcosystem>(ecosystem: &E, nodes: Vec<FlatNode>) -> Hierarchy {
    let mut seen = DedupRegistry::new();
    let flat: Vec<FlatNode> = nodes
        .into_iter()
        .filter(|flat| seen.register(flat.node.identity_key()))
        .collect();

    let mut parent_of: Vec<Option<usize>> = vec![None; flat.len()];
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut reached: Vec<bool> = flat.iter().map(|entry| !entry.vendored).collect();
    let mut queue: VecDeque<usize> = (0..flat.len()).filter(|&i| reached[i]).collect();
    let mut attached = DedupRegistry::new();

    while let Some(parent) = queue.pop_front() {
        for declared in &flat[parent].node.declared_children {
            let found = flat
                .iter()
                .position(|c| ecosystem.matches_child(&c.node, &declared.name, &declared.version))
                .or_else(|| {
                    flat.iter().position(|c| {
                        ecosystem.satisfies_child(&c.node, &declared.name, &declared.version)
                    })
                });
            let Some(child) = found else {
                continue;
            };
            if child == parent || is_ancestor(&parent_of, child, parent) {
                continue;
            }
            if !attached.register(flat[child].node.identity_key()) {
                continue;
            }
            parent_of[child] = Some(parent);
            children_of[parent].push(child);
            if !reached[child] {
                reached[child] = true;
                queue.push_back(child);
            }
        }
    }

    let mut registry = DedupRegistry::new();
    let mut roots = Vec::new();
    for (index, entry) in flat.iter().enumerate() {
        if !reached[index] {
            tracing::debug!(
                dependency = %entry.node.unique_dependency_name(),
                "Dropping vendored package nothing depends on"
            );
            continue;
        }
        if parent_of[index].is_none() {
            roots.push(materialize(&flat, &children_of, index, &mut registry));
        }
    }

    Hierarchy { roots, registry }
}

/// Whether `candidate` is `node` or one of its ancestors
fn is_ancestor(parent_of: &[Option<usize>], candidate: usize, node: usize) -> bool {
    let mut current = Some(node);
    while let Some(index) = current {
        if index == candidate {
            return true;
        }
        current = parent_of[index];
    }
    false
}

fn materialize(
    flat: &[FlatNode],
    children_of: &[Vec<usize>],
    index: usize,
    registry: &mut DedupRegistry,
) -> DependencyNode {
    let mut node = flat[index].node.clone();
    registry.register(node.identity_key());
    node.children = children_of[index]
        .iter()
        .map(|&child| materialize(flat, children_of, child, registry))
        .collect();
    node
}

/// Remove repeated identity keys from a forest, keeping the first occurrence
/// in preorder. A removed node takes its subtree with it.
pub fn dedup_forest(nodes: Vec<DependencyNode>, registry: &mut DedupRegistry) -> Vec<DependencyNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            if !registry.register(node.identity_key()) {
                return None;
            }
            let children = std::mem::take(&mut node.children);
            node.children = dedup_forest(children, registry);
            Some(node)
        })
        .collect()
}
