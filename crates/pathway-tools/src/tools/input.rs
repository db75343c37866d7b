//! Structured node input shared by add_node and update_node.

use pathway_graph::Node;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct NodeInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub edges: BTreeMap<String, Vec<String>>,
}

impl NodeInput {
    pub fn parse(args: Value) -> Result<Self, String> {
        serde_json::from_value(args).map_err(|e| format!("Invalid node input: {}", e))
    }

    /// Build a node stamped with the current time.
    pub fn into_node(self) -> Node {
        let mut node = Node::new(self.id, self.name)
            .with_summary(self.summary)
            .with_description(self.description)
            .with_tags(self.tags);
        for (rel, targets) in self.edges {
            if !targets.is_empty() {
                node.set_edge_ids(rel, targets);
            }
        }
        node
    }
}

pub fn node_schema(singular: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": format!("Unique {} ID; also used as the file name", singular)
            },
            "name": { "type": "string", "description": "Display name" },
            "summary": { "type": "string", "description": "One-line summary" },
            "description": { "type": "string", "description": "Full Markdown body" },
            "tags": {
                "type": "array",
                "items": { "type": "string" }
            },
            "edges": {
                "type": "object",
                "description": "Relationship name to ordered list of target IDs",
                "additionalProperties": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            }
        },
        "required": ["id", "name"]
    })
}
