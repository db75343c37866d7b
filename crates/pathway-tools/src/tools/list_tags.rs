//! List tags tool

use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_tags;
use serde_json::{json, Value};

pub struct ListTagsTool {
    graph: GraphHandle,
}

impl ListTagsTool {
    pub fn new(graph: GraphHandle) -> Self {
        Self { graph }
    }
}

#[async_trait::async_trait]
impl Tool for ListTagsTool {
    fn name(&self) -> &str { "list_tags" }

    fn description(&self) -> &str {
        "List every tag in use with the number of entries carrying it."
    }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let store = self.graph.read().await;
        ToolResult::text(render_tags(&store.graph().all_tags()))
    }
}
