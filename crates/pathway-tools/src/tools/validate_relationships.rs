//! Validate relationships tool: advisory check for unregistered names

use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_unregistered;
use serde_json::{json, Value};

pub struct ValidateRelationshipsTool {
    graph: GraphHandle,
}

impl ValidateRelationshipsTool {
    pub fn new(graph: GraphHandle) -> Self {
        Self { graph }
    }
}

#[async_trait::async_trait]
impl Tool for ValidateRelationshipsTool {
    fn name(&self) -> &str { "validate_relationships" }

    fn description(&self) -> &str {
        "Report relationship names used on edges that have no registered definition."
    }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let store = self.graph.read().await;
        ToolResult::text(render_unregistered(&store.graph().unregistered_relationships()))
    }
}
