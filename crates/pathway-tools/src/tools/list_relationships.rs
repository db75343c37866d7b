//! List relationships tool

use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_relationships;
use serde_json::{json, Value};

pub struct ListRelationshipsTool {
    graph: GraphHandle,
}

impl ListRelationshipsTool {
    pub fn new(graph: GraphHandle) -> Self {
        Self { graph }
    }
}

#[async_trait::async_trait]
impl Tool for ListRelationshipsTool {
    fn name(&self) -> &str { "list_relationships" }

    fn description(&self) -> &str {
        "List registered relationship types with their direction and description."
    }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let store = self.graph.read().await;
        ToolResult::text(render_relationships(&store.graph().relationships().list()))
    }
}
