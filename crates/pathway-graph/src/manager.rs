//! Graph manager: owns every node, the tag index, and the relationship registry.
//!
//! Nodes live in an arena of slots addressed by `NodeRef`; an ID index maps node IDs to
//! slots. Resolved edges point at slots, so replacing a node in place (update) keeps
//! every inbound edge pointing at the current value.
//!
//! Mutations that can break acyclicity or referential integrity run against a clone
//! first: clone, apply, check cycles, resolve. Only a clean trial is applied to the
//! live graph, which is then re-resolved and re-indexed.

use crate::cycles::find_cycles;
use crate::node::{validate_id, Edge, Node, NodeRef};
use crate::relationship::{Relationship, RelationshipRegistry};
use crate::tags::TagIndex;
use pathway_core::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of `GraphManager::get_many`: found nodes plus the IDs that were not.
#[derive(Debug)]
pub struct GetMany<'a> {
    pub found: Vec<&'a Node>,
    pub missing: Vec<String>,
}

impl GetMany<'_> {
    /// A composite not-found error naming every missing ID, if any.
    pub fn error(&self) -> Option<Error> {
        if self.missing.is_empty() {
            None
        } else {
            Some(Error::MissingNodes(self.missing.clone()))
        }
    }
}

#[derive(Debug, Default)]
pub struct GraphManager {
    slots: Vec<Option<Node>>,
    index: HashMap<String, NodeRef>,
    free: Vec<usize>,
    tags: TagIndex,
    relationships: RelationshipRegistry,
}

impl GraphManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relationships(relationships: RelationshipRegistry) -> Self {
        Self {
            relationships,
            ..Self::default()
        }
    }

    pub fn relationships(&self) -> &RelationshipRegistry {
        &self.relationships
    }

    /// Register a relationship type and re-resolve so existing edges pick it up.
    pub fn register_relationship(&mut self, rel: Relationship) -> Result<Arc<Relationship>> {
        let registered = self.relationships.register(rel)?;
        self.resolve_edges()?;
        Ok(registered)
    }

    /// Relationship names used by nodes without a registered definition.
    pub fn unregistered_relationships(&self) -> BTreeSet<String> {
        self.relationships.validate_against(self.nodes())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    // -- Reads ------------------------------------------------------------

    pub fn get(&self, id: &str) -> Result<&Node> {
        if id.is_empty() {
            return Err(Error::invalid("node id must not be empty"));
        }
        self.index
            .get(id)
            .and_then(|r| self.node(*r))
            .ok_or_else(|| Error::not_found(format!("node '{}'", id)))
    }

    /// Follow a resolved edge.
    pub fn node(&self, node_ref: NodeRef) -> Option<&Node> {
        self.slots.get(node_ref.0).and_then(Option::as_ref)
    }

    pub fn node_ref(&self, id: &str) -> Option<NodeRef> {
        self.index.get(id).copied()
    }

    /// All live nodes, in slot order.
    pub fn list(&self) -> Vec<&Node> {
        self.nodes().collect()
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    fn entries(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeRef(i), n)))
    }

    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> GetMany<'_> {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for id in ids {
            match self.index.get(id.as_ref()).and_then(|r| self.node(*r)) {
                Some(node) => found.push(node),
                None => missing.push(id.as_ref().to_string()),
            }
        }
        GetMany { found, missing }
    }

    pub fn get_by_tag(&self, tag: &str) -> Result<Vec<&Node>> {
        if tag.is_empty() {
            return Err(Error::invalid("tag must not be empty"));
        }
        Ok(self
            .tags
            .nodes_for(tag)
            .iter()
            .filter_map(|r| self.node(*r))
            .collect())
    }

    /// Tag to number of nodes carrying it.
    pub fn all_tags(&self) -> BTreeMap<String, usize> {
        self.tags.counts()
    }

    /// Nodes with an edge to `id`, as (relationship name, source node) pairs.
    pub fn inbound(&self, id: &str) -> Vec<(&str, &Node)> {
        let mut sources = Vec::new();
        for node in self.nodes() {
            for (rel, targets) in node.edge_ids() {
                if targets.iter().any(|t| t == id) {
                    sources.push((rel.as_str(), node));
                }
            }
        }
        sources
    }

    // -- Mutations --------------------------------------------------------

    pub fn add(&mut self, node: Node) -> Result<()> {
        node.validate()?;
        if self.index.contains_key(&node.id) {
            return Err(Error::already_exists(format!("node '{}'", node.id)));
        }

        let mut trial = self.clone_for_validation()?;
        trial.insert(node.clone());
        trial.validate_trial()?;

        info!("adding node {}", node.id);
        self.insert(node);
        self.commit()
    }

    /// Replace a node wholesale. `created_at` is carried over from the stored node.
    pub fn update(&mut self, mut node: Node) -> Result<()> {
        node.validate()?;
        let Some(slot) = self.index.get(&node.id).copied() else {
            return Err(Error::not_found(format!("node '{}'", node.id)));
        };
        if let Some(existing) = self.node(slot) {
            node.created_at = existing.created_at;
        }

        let mut trial = self.clone_for_validation()?;
        trial.slots[slot.0] = Some(node.clone());
        trial.validate_trial()?;

        info!("updating node {}", node.id);
        self.slots[slot.0] = Some(node);
        self.commit()
    }

    /// Remove a node and every edge pointing at it. Removing edges cannot create a
    /// cycle, so no trial run is needed.
    pub fn delete(&mut self, id: &str) -> Result<Node> {
        if id.is_empty() {
            return Err(Error::invalid("node id must not be empty"));
        }
        let Some(slot) = self.index.remove(id) else {
            return Err(Error::not_found(format!("node '{}'", id)));
        };

        let mut purged = 0;
        for other in self.slots.iter_mut().flatten() {
            if other.id != id && other.purge_target(id) {
                purged += 1;
            }
        }
        let removed = self.slots[slot.0].take();
        self.free.push(slot.0);
        self.rebuild_tag_index();

        info!("deleted node {} ({} inbound edge lists purged)", id, purged);
        removed.ok_or_else(|| Error::not_found(format!("node '{}'", id)))
    }

    fn insert(&mut self, node: Node) -> NodeRef {
        let id = node.id.clone();
        let node_ref = match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(node);
                NodeRef(i)
            }
            None => {
                self.slots.push(Some(node));
                NodeRef(self.slots.len() - 1)
            }
        };
        self.index.insert(id, node_ref);
        node_ref
    }

    /// Insert without validation. The caller must run `check_cycles`, `resolve_edges`
    /// and `rebuild_tag_index` before handing the graph out.
    pub(crate) fn insert_unchecked(&mut self, node: Node) -> Result<()> {
        validate_id(&node.id)?;
        if self.index.contains_key(&node.id) {
            return Err(Error::already_exists(format!("node '{}'", node.id)));
        }
        self.insert(node);
        Ok(())
    }

    fn validate_trial(&mut self) -> Result<()> {
        if let Err(e) = self.check_cycles() {
            warn!("rejected mutation: {}", e);
            return Err(e);
        }
        self.resolve_edges()
    }

    fn commit(&mut self) -> Result<()> {
        self.resolve_edges()?;
        self.rebuild_tag_index();
        Ok(())
    }

    // -- Validation and derived state --------------------------------------

    /// Deep copy for trial mutations: every node cloned into the same slot layout,
    /// then resolved against the copy.
    pub fn clone_for_validation(&self) -> Result<GraphManager> {
        let mut copy = GraphManager {
            slots: self.slots.clone(),
            index: self.index.clone(),
            free: self.free.clone(),
            tags: TagIndex::new(),
            relationships: self.relationships.clone(),
        };
        copy.resolve_edges()?;
        copy.rebuild_tag_index();
        Ok(copy)
    }

    /// Fails with every cycle found, across all relationship names.
    pub fn check_cycles(&self) -> Result<()> {
        let by_id: BTreeMap<&str, &Node> = self.nodes().map(|n| (n.id.as_str(), n)).collect();
        let cycles = find_cycles(&by_id);
        if cycles.is_empty() {
            Ok(())
        } else {
            Err(Error::CycleDetected(cycles))
        }
    }

    /// Rebuild every node's resolved edges from its ID layer. Fails on the first
    /// target that does not exist, leaving the previous resolution untouched.
    pub fn resolve_edges(&mut self) -> Result<()> {
        let mut resolved = Vec::with_capacity(self.index.len());
        for (node_ref, node) in self.entries() {
            let mut edges = BTreeMap::new();
            for (rel, ids) in node.edge_ids() {
                let definition = self.relationships.get(rel);
                let mut list = Vec::with_capacity(ids.len());
                for target in ids {
                    let Some(to) = self.index.get(target).copied() else {
                        return Err(Error::UnresolvedEdge {
                            source_id: node.id.clone(),
                            relationship: rel.clone(),
                            target: target.clone(),
                        });
                    };
                    list.push(Edge::new(to, target.clone(), definition.clone()));
                }
                edges.insert(rel.clone(), list);
            }
            resolved.push((node_ref, edges));
        }

        for (node_ref, edges) in resolved {
            if let Some(node) = self.slots[node_ref.0].as_mut() {
                node.replace_resolved(edges);
            }
        }
        debug!("resolved edges for {} nodes", self.index.len());
        Ok(())
    }

    pub fn rebuild_tag_index(&mut self) {
        let mut tags = TagIndex::new();
        tags.rebuild(self.entries());
        self.tags = tags;
    }

    /// Edge/ID agreement across every node.
    pub fn check_consistency(&self) -> Result<()> {
        let mut bad = BTreeSet::new();
        for node in self.nodes() {
            if let Err(Error::Inconsistent(names)) = node.check_edge_consistency() {
                bad.extend(names.into_iter().map(|n| format!("{}.{}", node.id, n)));
            }
        }
        if bad.is_empty() {
            Ok(())
        } else {
            Err(Error::Inconsistent(bad.into_iter().collect()))
        }
    }
}
