//! Property tests for hierarchy reconstruction.

use depscout_deps::{
    build_hierarchy, ChildRef, DependencyNode, Ecosystem, FlatNode, IdentityKey, NpmEcosystem,
};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};

type Spec = (usize, usize, Vec<(usize, usize)>, bool);

fn to_flat((name, minor, deps, vendored): &Spec) -> FlatNode {
    let name_s = format!("p{name}");
    let version = format!("1.{minor}.0");
    let mut node = DependencyNode::new(
        Ecosystem::Npm,
        name_s.clone(),
        format!("{name_s}-{version}.tgz"),
        version,
    );
    node.checksum = format!("c{name}{minor}");
    node.declared_children = deps
        .iter()
        .map(|(child, child_minor)| ChildRef {
            name: format!("p{child}"),
            version: format!("1.{child_minor}.0"),
        })
        .collect();
    FlatNode {
        node,
        vendored: *vendored,
    }
}

fn specs() -> impl Strategy<Value = Vec<Spec>> {
    prop::collection::vec(
        (
            0usize..6,
            0usize..3,
            prop::collection::vec((0usize..6, 0usize..3), 0..4),
            any::<bool>(),
        ),
        0..14,
    )
}

/// Specs left after collapsing repeated identities, first occurrence winning
fn first_occurrences(specs: &[Spec]) -> Vec<&Spec> {
    let mut seen = HashSet::new();
    specs
        .iter()
        .filter(|(name, minor, _, _)| seen.insert((*name, *minor)))
        .collect()
}

/// Indices of `nodes` reachable from a non-vendored node through declared edges
fn reachable(nodes: &[&Spec]) -> Vec<usize> {
    let mut reached: Vec<bool> = nodes.iter().map(|s| !s.3).collect();
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| reached[i]).collect();
    while let Some(index) = queue.pop_front() {
        for (child, child_minor) in &nodes[index].2 {
            if let Some(found) = nodes
                .iter()
                .position(|s| s.0 == *child && s.1 == *child_minor)
            {
                if !reached[found] {
                    reached[found] = true;
                    queue.push_back(found);
                }
            }
        }
    }
    (0..nodes.len()).filter(|&i| reached[i]).collect()
}

fn collect_keys(node: &DependencyNode, keys: &mut Vec<IdentityKey>) {
    node.walk(&mut |n| keys.push(n.identity_key()));
}

fn has_self_loop(node: &DependencyNode, ancestors: &mut Vec<IdentityKey>) -> bool {
    let key = node.identity_key();
    if ancestors.contains(&key) {
        return true;
    }
    ancestors.push(key);
    let found = node.children.iter().any(|c| has_self_loop(c, ancestors));
    ancestors.pop();
    found
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn keys_are_unique_across_the_graph(specs in specs()) {
        let eco = NpmEcosystem::default();
        let h = build_hierarchy(&eco, specs.iter().map(to_flat).collect());

        let mut keys = Vec::new();
        for root in &h.roots {
            collect_keys(root, &mut keys);
        }
        let unique: HashSet<_> = keys.iter().cloned().collect();
        prop_assert_eq!(unique.len(), keys.len());
        prop_assert_eq!(unique.len(), h.registry.len());
    }

    #[test]
    fn no_node_is_its_own_descendant(specs in specs()) {
        let eco = NpmEcosystem::default();
        let h = build_hierarchy(&eco, specs.iter().map(to_flat).collect());
        for root in &h.roots {
            prop_assert!(!has_self_loop(root, &mut Vec::new()));
        }
    }

    #[test]
    fn building_twice_gives_the_same_graph(specs in specs()) {
        let eco = NpmEcosystem::default();
        let first = build_hierarchy(&eco, specs.iter().map(to_flat).collect());
        let second = build_hierarchy(&eco, specs.iter().map(to_flat).collect());

        prop_assert_eq!(&first.roots, &second.roots);
        prop_assert_eq!(first.registry, second.registry);
    }

    #[test]
    fn non_vendored_nodes_are_never_lost(specs in specs()) {
        let eco = NpmEcosystem::default();
        let h = build_hierarchy(&eco, specs.iter().map(to_flat).collect());

        for spec in first_occurrences(&specs).into_iter().filter(|s| !s.3) {
            let key = to_flat(spec).node.identity_key();
            prop_assert!(h.registry.contains(&key));
        }
    }

    #[test]
    fn nodes_reachable_from_the_project_are_present(specs in specs()) {
        let eco = NpmEcosystem::default();
        let h = build_hierarchy(&eco, specs.iter().map(to_flat).collect());

        let nodes = first_occurrences(&specs);
        for index in reachable(&nodes) {
            let key = to_flat(nodes[index]).node.identity_key();
            prop_assert!(h.registry.contains(&key));
        }
    }
}
