//! Update node tool: whole-node replacement that keeps the creation time

use super::finish;
use super::input::{node_schema, NodeInput};
use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_node;
use serde_json::Value;

pub struct UpdateNodeTool {
    graph: GraphHandle,
    description: String,
}

impl UpdateNodeTool {
    pub fn new(graph: GraphHandle) -> Self {
        let naming = graph.naming();
        let description = format!(
            "Replace an existing {} wholesale. Every field, including edges, is taken \
             from the input; omitted fields become empty. The creation time is kept.",
            naming.singular
        );
        Self { graph, description }
    }
}

#[async_trait::async_trait]
impl Tool for UpdateNodeTool {
    fn name(&self) -> &str { "update_node" }

    fn description(&self) -> &str { &self.description }

    fn input_schema(&self) -> Value {
        node_schema(&self.graph.naming().singular)
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let input = match NodeInput::parse(args) {
            Ok(i) => i,
            Err(e) => return ToolResult::invalid(e),
        };
        let node = input.into_node();
        let id = node.id.clone();
        let naming = self.graph.naming();

        let result = self
            .graph
            .mutate(|g| {
                g.update(node)?;
                let stored = g.get(&id)?;
                Ok(format!(
                    "Updated {} `{}`.\n\n{}",
                    naming.singular,
                    id,
                    render_node(g, stored, naming)
                ))
            })
            .await;

        match result {
            Ok(committed) => finish(committed),
            Err(e) => e.into(),
        }
    }
}
