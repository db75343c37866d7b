//! Tag index: secondary map from tag to the nodes carrying it.

use crate::node::{Node, NodeRef};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, Vec<NodeRef>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from scratch. A tag repeated on one node is indexed once.
    pub fn rebuild<'a>(&mut self, nodes: impl IntoIterator<Item = (NodeRef, &'a Node)>) {
        self.by_tag.clear();
        for (node_ref, node) in nodes {
            for tag in &node.tags {
                let refs = self.by_tag.entry(tag.clone()).or_default();
                if !refs.contains(&node_ref) {
                    refs.push(node_ref);
                }
            }
        }
    }

    /// Nodes carrying `tag`, in index order. Unknown tags yield an empty slice.
    pub fn nodes_for(&self, tag: &str) -> &[NodeRef] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.by_tag
            .iter()
            .map(|(tag, refs)| (tag.clone(), refs.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
