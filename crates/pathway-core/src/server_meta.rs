//! Server metadata: serde structs for `<data root>/mcp.yaml`
//!
//! Pure types and parsing only. Every field falls back to its default when absent.

use serde::Deserialize;
use std::path::Path;

pub const SERVER_META_FILE: &str = "mcp.yaml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerMeta {
    pub server: ServerInfo,
    pub naming: Naming,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerInfo {
    pub name: String,
    pub display_name: String,
    pub instructions: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "pathway".into(),
            display_name: "Pathway".into(),
            instructions: "Development workflow knowledge stored as a graph of nodes. \
                           Use list_nodes or list_tags to explore, get_node to read one node \
                           with its related nodes."
                .into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Naming {
    pub node: NodeNaming,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeNaming {
    pub singular: String,
    pub plural: String,
    pub display_singular: String,
    pub display_plural: String,
}

impl Default for NodeNaming {
    fn default() -> Self {
        Self {
            singular: "node".into(),
            plural: "nodes".into(),
            display_singular: "Node".into(),
            display_plural: "Nodes".into(),
        }
    }
}

impl ServerMeta {
    /// Parse from YAML text. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> crate::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `mcp.yaml` from a data root. Missing or malformed files fall back to defaults.
    pub fn load(root: &Path) -> Self {
        let path = root.join(SERVER_META_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match Self::from_yaml(&content) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
