//! Node entity: one unit of workflow knowledge and its outgoing edges.
//!
//! Edges live in two layers. `edge_ids` is the persisted form (relationship name to
//! ordered target IDs, written under the `edges` key). `edges` is the resolved form:
//! the same targets as `NodeRef` handles into the owning `GraphManager`. The resolved
//! layer is never serialized and is rebuilt by `GraphManager::resolve_edges`.

use crate::relationship::Relationship;
use crate::timestamp;
use chrono::{DateTime, Utc};
use pathway_core::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Handle to a node slot inside a `GraphManager`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub(crate) usize);

impl NodeRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A resolved edge: target handle, target ID, and the relationship definition
/// (absent while the relationship name is unregistered).
#[derive(Clone, Debug)]
pub struct Edge {
    pub to: NodeRef,
    pub target: String,
    pub relationship: Option<Arc<Relationship>>,
}

impl Edge {
    pub fn new(
        to: NodeRef,
        target: impl Into<String>,
        relationship: Option<Arc<Relationship>>,
    ) -> Self {
        Self {
            to,
            target: target.into(),
            relationship,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "edges", default, serialize_with = "serialize_edge_ids")]
    edge_ids: BTreeMap<String, Vec<String>>,
    #[serde(with = "timestamp", default = "timestamp::now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp", default = "timestamp::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    edges: BTreeMap<String, Vec<Edge>>,
}

/// Empty lists are not written; absent is the canonical empty form.
fn serialize_edge_ids<S: Serializer>(
    ids: &BTreeMap<String, Vec<String>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(ids.iter().filter(|(_, targets)| !targets.is_empty()))
}

/// Longest file name most filesystems accept, in bytes.
const MAX_FILE_NAME_BYTES: usize = 255;

/// IDs double as file names, so path separators and dot entries are refused, and
/// `<id>.yaml` must fit in one file name.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid("node id must not be empty"));
    }
    if id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
        return Err(Error::invalid(format!(
            "node id '{}' must not contain path separators",
            id
        )));
    }
    if id.len() + ".yaml".len() > MAX_FILE_NAME_BYTES {
        return Err(Error::invalid(format!(
            "node id is {} bytes; at most {} are allowed",
            id.len(),
            MAX_FILE_NAME_BYTES - ".yaml".len()
        )));
    }
    Ok(())
}

impl Node {
    /// New node stamped with the current time for both timestamps.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = timestamp::now();
        Self {
            id: id.into(),
            name: name.into(),
            summary: String::new(),
            description: String::new(),
            tags: Vec::new(),
            edge_ids: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            edges: BTreeMap::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder form of `set_edge_ids`.
    pub fn with_edge_ids<I, S>(mut self, relationship: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_edge_ids(relationship, ids.into_iter().map(Into::into).collect());
        self
    }

    // -- ID layer ---------------------------------------------------------

    /// Target IDs for a relationship; empty when the relationship is absent.
    pub fn get_edge_ids(&self, relationship: &str) -> &[String] {
        self.edge_ids
            .get(relationship)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_ids(&self) -> &BTreeMap<String, Vec<String>> {
        &self.edge_ids
    }

    /// Replace the target list. Targets are not checked for existence.
    pub fn set_edge_ids(&mut self, relationship: impl Into<String>, ids: Vec<String>) {
        self.edge_ids.insert(relationship.into(), ids);
    }

    /// Append a target ID unless it is already listed under this relationship.
    pub fn add_edge_id(&mut self, relationship: impl Into<String>, id: impl Into<String>) {
        let id = id.into();
        let targets = self.edge_ids.entry(relationship.into()).or_default();
        if !targets.contains(&id) {
            targets.push(id);
        }
    }

    /// Relationship names with at least one target.
    pub fn relationship_names(&self) -> impl Iterator<Item = &str> {
        self.edge_ids
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(name, _)| name.as_str())
    }

    // -- Resolved layer ---------------------------------------------------

    pub fn edges(&self, relationship: &str) -> &[Edge] {
        self.edges
            .get(relationship)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn resolved_edges(&self) -> &BTreeMap<String, Vec<Edge>> {
        &self.edges
    }

    /// Replace resolved edges and their IDs together.
    pub fn set_edges(&mut self, relationship: impl Into<String>, edges: Vec<Edge>) -> Result<()> {
        let relationship = relationship.into();
        let mut seen = BTreeSet::new();
        for edge in &edges {
            if edge.target.is_empty() {
                return Err(Error::invalid(format!(
                    "edge under '{}' has no target",
                    relationship
                )));
            }
            if !seen.insert(edge.target.as_str()) {
                return Err(Error::invalid(format!(
                    "duplicate target '{}' under '{}'",
                    edge.target, relationship
                )));
            }
        }
        let ids = edges.iter().map(|e| e.target.clone()).collect();
        self.edge_ids.insert(relationship.clone(), ids);
        self.edges.insert(relationship, edges);
        Ok(())
    }

    /// Append one resolved edge and its ID.
    pub fn add_edge(&mut self, relationship: impl Into<String>, edge: Edge) -> Result<()> {
        let relationship = relationship.into();
        if edge.target.is_empty() {
            return Err(Error::invalid(format!(
                "edge under '{}' has no target",
                relationship
            )));
        }
        if self.get_edge_ids(&relationship).contains(&edge.target) {
            return Err(Error::invalid(format!(
                "duplicate target '{}' under '{}'",
                edge.target, relationship
            )));
        }
        self.edge_ids
            .entry(relationship.clone())
            .or_default()
            .push(edge.target.clone());
        self.edges.entry(relationship).or_default().push(edge);
        Ok(())
    }

    pub(crate) fn replace_resolved(&mut self, edges: BTreeMap<String, Vec<Edge>>) {
        self.edges = edges;
    }

    /// Verify both layers agree for every relationship: same targets, same order, no
    /// duplicates. A node that has never been resolved is trivially consistent.
    pub fn check_edge_consistency(&self) -> Result<()> {
        if self.edges.is_empty() {
            return Ok(());
        }
        let names: BTreeSet<&str> = self
            .edge_ids
            .keys()
            .chain(self.edges.keys())
            .map(String::as_str)
            .collect();

        let mut bad = Vec::new();
        for name in names {
            let ids = self.get_edge_ids(name);
            let resolved = self.edges(name);
            let unique: BTreeSet<&String> = ids.iter().collect();
            let matches = ids.len() == resolved.len()
                && unique.len() == ids.len()
                && ids.iter().zip(resolved).all(|(id, edge)| *id == edge.target);
            if !matches {
                bad.push(name.to_string());
            }
        }
        if bad.is_empty() {
            Ok(())
        } else {
            Err(Error::Inconsistent(bad))
        }
    }

    /// Shape checks applied before a node enters a graph.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;
        for (name, ids) in &self.edge_ids {
            if name.trim().is_empty() {
                return Err(Error::invalid(format!(
                    "node '{}' has an edge list with an empty relationship name",
                    self.id
                )));
            }
            let mut seen = BTreeSet::new();
            for id in ids {
                if id.is_empty() {
                    return Err(Error::invalid(format!(
                        "node '{}' has an empty target under '{}'",
                        self.id, name
                    )));
                }
                if !seen.insert(id.as_str()) {
                    return Err(Error::invalid(format!(
                        "node '{}' lists '{}' twice under '{}'",
                        self.id, id, name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Remove every occurrence of `target` from both layers. Relationship entries that
    /// become empty are dropped. Returns whether anything was removed.
    pub(crate) fn purge_target(&mut self, target: &str) -> bool {
        let mut removed = false;
        self.edge_ids.retain(|_, ids| {
            let before = ids.len();
            ids.retain(|id| id != target);
            removed |= ids.len() != before;
            !ids.is_empty()
        });
        self.edges.retain(|_, edges| {
            edges.retain(|e| e.target != target);
            !edges.is_empty()
        });
        removed
    }
}

/// Copies every persisted field. The resolved `edges` layer is left empty; the
/// copy has to be resolved against whichever graph it is installed into.
impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            edge_ids: self.edge_ids.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            edges: BTreeMap::new(),
        }
    }
}

/// Structural equality over persisted fields. Empty and absent edge lists are equal.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        fn non_empty(
            ids: &BTreeMap<String, Vec<String>>,
        ) -> impl Iterator<Item = (&String, &Vec<String>)> {
            ids.iter().filter(|(_, v)| !v.is_empty())
        }
        self.id == other.id
            && self.name == other.name
            && self.summary == other.summary
            && self.description == other.description
            && self.tags == other.tags
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && non_empty(&self.edge_ids).eq(non_empty(&other.edge_ids))
    }
}

impl Eq for Node {}
