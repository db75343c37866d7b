//! Add node tool

use super::finish;
use super::input::{node_schema, NodeInput};
use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_node;
use serde_json::Value;

pub struct AddNodeTool {
    graph: GraphHandle,
    description: String,
}

impl AddNodeTool {
    pub fn new(graph: GraphHandle) -> Self {
        let naming = graph.naming();
        let description = format!(
            "Create a {} with its full edge set. Fails if the ID is taken, a target \
             does not exist, or an edge would close a cycle.",
            naming.singular
        );
        Self { graph, description }
    }
}

#[async_trait::async_trait]
impl Tool for AddNodeTool {
    fn name(&self) -> &str { "add_node" }

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
                g.add(node)?;
                let stored = g.get(&id)?;
                Ok(format!(
                    "Added {} `{}`.\n\n{}",
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
