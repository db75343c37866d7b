//! Per-relationship cycle detection.
//!
//! Each relationship name is checked as its own graph with an iterative DFS that keeps
//! a visited set and the current recursion stack. Reaching a node that is on the stack
//! closes a cycle; the reported path runs from that node's stack position back to
//! itself. Roots and relationship names are visited in sorted order so reports are
//! stable across runs.

use crate::node::Node;
use pathway_core::CyclePath;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Every distinct cycle across all relationship names. Unregistered names are
/// checked like any other.
pub fn find_cycles<'a>(nodes: &BTreeMap<&'a str, &'a Node>) -> Vec<CyclePath> {
    let relationships: BTreeSet<&str> = nodes
        .values()
        .flat_map(|n| n.relationship_names())
        .collect();

    let mut cycles = Vec::new();
    for rel in relationships {
        for cycle in cycles_in(nodes, rel) {
            if !cycles.contains(&cycle) {
                cycles.push(cycle);
            }
        }
    }
    cycles
}

fn targets<'a>(nodes: &BTreeMap<&'a str, &'a Node>, id: &str, rel: &str) -> &'a [String] {
    nodes
        .get(id)
        .copied()
        .map(|n| n.get_edge_ids(rel))
        .unwrap_or(&[])
}

fn cycles_in<'a>(nodes: &BTreeMap<&'a str, &'a Node>, rel: &str) -> Vec<CyclePath> {
    let mut found = Vec::new();
    let mut visited: HashSet<&'a str> = HashSet::new();

    for &root in nodes.keys() {
        if visited.contains(root) || targets(nodes, root, rel).is_empty() {
            continue;
        }
        visited.insert(root);
        let mut on_stack: HashSet<&'a str> = HashSet::from([root]);
        // (node, index of the next outgoing edge to follow)
        let mut frames: Vec<(&'a str, usize)> = vec![(root, 0)];

        while let Some(top) = frames.len().checked_sub(1) {
            let (id, next) = frames[top];
            let out = targets(nodes, id, rel);
            if next >= out.len() {
                on_stack.remove(id);
                frames.pop();
                continue;
            }
            frames[top].1 += 1;
            let target = out[next].as_str();

            if on_stack.contains(target) {
                if let Some(start) = frames.iter().position(|(f, _)| *f == target) {
                    let mut path: Vec<String> =
                        frames[start..].iter().map(|(f, _)| f.to_string()).collect();
                    path.push(target.to_string());
                    let cycle = CyclePath {
                        relationship: rel.to_string(),
                        path,
                    };
                    if !found.contains(&cycle) {
                        found.push(cycle);
                    }
                }
            } else if visited.insert(target) {
                on_stack.insert(target);
                frames.push((target, 0));
            }
        }
    }
    found
}
