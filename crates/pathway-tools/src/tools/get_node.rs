//! Get node tool: one node with its related nodes

use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_node;
use serde_json::{json, Value};

pub struct GetNodeTool {
    graph: GraphHandle,
    description: String,
}

impl GetNodeTool {
    pub fn new(graph: GraphHandle) -> Self {
        let naming = graph.naming();
        let description = format!(
            "Fetch one {} by ID. Related {} are listed by relationship: prerequisites \
             before it, follow-ups after it, and {} that reference it at the end.",
            naming.singular, naming.plural, naming.plural
        );
        Self { graph, description }
    }
}

#[async_trait::async_trait]
impl Tool for GetNodeTool {
    fn name(&self) -> &str { "get_node" }

    fn description(&self) -> &str { &self.description }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "ID to fetch" }
            },
            "required": ["id"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let id = match args["id"].as_str() {
            Some(id) => id,
            None => return ToolResult::invalid("Missing required parameter: id"),
        };

        let store = self.graph.read().await;
        let graph = store.graph();
        match graph.get(id) {
            Ok(node) => ToolResult::text(render_node(graph, node, self.graph.naming())),
            Err(e) => e.into(),
        }
    }
}
