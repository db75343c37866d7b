//! List nodes tool: all nodes, or those carrying any of the given tags

use crate::handle::GraphHandle;
use crate::registry::{Tool, ToolResult};
use crate::render::render_node_list;
use pathway_graph::Node;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub struct ListNodesTool {
    graph: GraphHandle,
    description: String,
}

impl ListNodesTool {
    pub fn new(graph: GraphHandle) -> Self {
        let naming = graph.naming();
        let description = format!(
            "List {} sorted by ID. With `tags`, only {} carrying at least one of the tags.",
            naming.plural, naming.plural
        );
        Self { graph, description }
    }
}

fn parse_tags(args: &Value) -> Result<Vec<String>, String> {
    match &args["tags"] {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "tags must be strings".to_string())
            })
            .collect(),
        _ => Err("tags must be a string or an array of strings".to_string()),
    }
}

#[async_trait::async_trait]
impl Tool for ListNodesTool {
    fn name(&self) -> &str { "list_nodes" }

    fn description(&self) -> &str { &self.description }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional tag filter (union)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let tags = match parse_tags(&args) {
            Ok(t) => t,
            Err(e) => return ToolResult::invalid(e),
        };

        let store = self.graph.read().await;
        let graph = store.graph();
        let naming = self.graph.naming();

        let mut selected: BTreeMap<&str, &Node> = BTreeMap::new();
        if tags.is_empty() {
            selected.extend(graph.list().into_iter().map(|n| (n.id.as_str(), n)));
        } else {
            for tag in &tags {
                match graph.get_by_tag(tag) {
                    Ok(nodes) => selected.extend(nodes.into_iter().map(|n| (n.id.as_str(), n))),
                    Err(e) => return e.into(),
                }
            }
        }

        let nodes: Vec<&Node> = selected.into_values().collect();
        let heading = if tags.is_empty() {
            naming.display_plural.clone()
        } else {
            format!("{} tagged {}", naming.display_plural, tags.join(", "))
        };
        ToolResult::text(render_node_list(&nodes, naming, &heading))
    }
}
