//! Relationship registry: declared edge types loaded from `relationships.yaml`.
//!
//! Every relationship name forms its own DAG across all nodes. The direction is a
//! rendering hint only: `backward` targets are predecessors and render before the
//! subject, `forward` targets render after it, `none` renders inline.

use crate::node::Node;
use pathway_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "backward")]
    Backward,
    #[serde(rename = "forward")]
    Forward,
    #[serde(rename = "none")]
    Inline,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backward => write!(f, "backward"),
            Self::Forward => write!(f, "forward"),
            Self::Inline => write!(f, "none"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "backward" => Ok(Self::Backward),
            "forward" => Ok(Self::Forward),
            "none" => Ok(Self::Inline),
            other => Err(Error::invalid(format!(
                "direction must be one of backward|forward|none, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub direction: Direction,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            direction,
        }
    }
}

/// Outcome of loading a relationships document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryLoad {
    pub registered: usize,
    /// One message per skipped entry.
    pub skipped: Vec<String>,
}

#[derive(Deserialize)]
struct RelationshipDocument {
    #[serde(default)]
    relationships: Vec<serde_yaml::Value>,
}

#[derive(Deserialize)]
struct RawRelationship {
    name: String,
    #[serde(default)]
    description: String,
    direction: String,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipRegistry {
    defs: BTreeMap<String, Arc<Relationship>>,
}

impl RelationshipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Names are unique for the lifetime of the registry.
    pub fn register(&mut self, rel: Relationship) -> Result<Arc<Relationship>> {
        if rel.name.trim().is_empty() {
            return Err(Error::invalid("relationship name must not be empty"));
        }
        if self.defs.contains_key(&rel.name) {
            return Err(Error::already_exists(format!("relationship '{}'", rel.name)));
        }
        debug!("registered relationship {} ({})", rel.name, rel.direction);
        let rel = Arc::new(rel);
        self.defs.insert(rel.name.clone(), rel.clone());
        Ok(rel)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Relationship>> {
        self.defs.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Snapshot copy of every definition, sorted by name.
    pub fn list(&self) -> Vec<Relationship> {
        self.defs.values().map(|r| r.as_ref().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Relationship names used by any node that have no definition. Advisory only.
    pub fn validate_against<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a Node>,
    ) -> BTreeSet<String> {
        nodes
            .into_iter()
            .flat_map(|n| n.relationship_names())
            .filter(|name| !self.defs.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Register every entry of a `relationships:` document.
    ///
    /// A document that does not parse is a `ConfigError`. Individual malformed or
    /// duplicate entries are skipped with a warning.
    pub fn load_yaml(&mut self, content: &str) -> Result<RegistryLoad> {
        if content.trim().is_empty() {
            return Ok(RegistryLoad::default());
        }
        let doc: RelationshipDocument = serde_yaml::from_str(content)
            .map_err(|e| Error::config(format!("relationships document: {}", e)))?;

        let mut report = RegistryLoad::default();
        for (i, entry) in doc.relationships.into_iter().enumerate() {
            let parsed = serde_yaml::from_value::<RawRelationship>(entry)
                .map_err(Error::from)
                .and_then(|raw| {
                    let direction = raw.direction.parse::<Direction>()?;
                    Ok(Relationship::new(raw.name, raw.description, direction))
                })
                .and_then(|rel| self.register(rel));
            match parsed {
                Ok(_) => report.registered += 1,
                Err(e) => {
                    warn!("skipping relationship entry #{}: {}", i, e);
                    report.skipped.push(format!("entry #{}: {}", i, e));
                }
            }
        }
        Ok(report)
    }
}
