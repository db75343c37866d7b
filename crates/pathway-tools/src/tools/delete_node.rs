//! Delete node tool: removes the node and every edge pointing at it

use super::finish;
use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::collections::BTreeSet;

pub struct DeleteNodeTool {
    graph: GraphHandle,
    description: String,
}

impl DeleteNodeTool {
    pub fn new(graph: GraphHandle) -> Self {
        let naming = graph.naming();
        let description = format!(
            "Delete a {} by ID. References to it from other {} are removed as well.",
            naming.singular, naming.plural
        );
        Self { graph, description }
    }
}

#[async_trait::async_trait]
impl Tool for DeleteNodeTool {
    fn name(&self) -> &str { "delete_node" }

    fn description(&self) -> &str { &self.description }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "ID to delete" }
            },
            "required": ["id"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let id = match args["id"].as_str() {
            Some(id) => id.to_string(),
            None => return ToolResult::invalid("Missing required parameter: id"),
        };
        let naming = self.graph.naming();

        let result = self
            .graph
            .mutate(|g| {
                let referrers: BTreeSet<String> = g
                    .inbound(&id)
                    .into_iter()
                    .map(|(_, source)| source.id.clone())
                    .collect();
                let removed = g.delete(&id)?;
                let mut msg = format!("Deleted {} `{}` ({}).", naming.singular, id, removed.name);
                if !referrers.is_empty() {
                    let list: Vec<String> = referrers.iter().map(|r| format!("`{}`", r)).collect();
                    msg.push_str(&format!(
                        "\n\nRemoved references from {} {}: {}",
                        referrers.len(),
                        naming.plural,
                        list.join(", ")
                    ));
                }
                Ok(msg)
            })
            .await;

        match result {
            Ok(committed) => finish(committed),
            Err(e) => e.into(),
        }
    }
}
