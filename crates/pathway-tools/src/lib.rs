//! Pathway Tools: graph operations exposed as MCP tools
//!
//! Each tool is a self-contained file in src/tools/.
//! To add a tool: create the file, implement Tool trait, register below.

pub mod handle;
pub mod registry;
pub mod render;
pub mod tools;

pub use handle::{Committed, GraphHandle};
pub use registry::{Tool, ToolDefinition, ToolRegistry, ToolResult};

/// Names of every builtin tool, read-only ones first.
pub const READ_TOOLS: &[&str] = &[
    "list_nodes",
    "get_node",
    "list_tags",
    "list_relationships",
    "validate_relationships",
];
pub const MUTATION_TOOLS: &[&str] = &["add_node", "update_node", "delete_node"];

/// Create the registry with every builtin tool.
pub fn create_default_registry(graph: GraphHandle) -> ToolRegistry {
    let all: Vec<&str> = READ_TOOLS.iter().chain(MUTATION_TOOLS).copied().collect();
    create_policy_registry(graph, &all)
}

/// Registry without mutation tools. Clients never see add/update/delete.
pub fn create_read_only_registry(graph: GraphHandle) -> ToolRegistry {
    create_policy_registry(graph, READ_TOOLS)
}

/// Create a policy-scoped tool registry.
///
/// Only registers tools whose names appear in `allowed_tools`.
/// If a tool isn't registered, the client never sees it and can't call it.
pub fn create_policy_registry(graph: GraphHandle, allowed_tools: &[&str]) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    for name in allowed_tools {
        let g = graph.clone();
        match *name {
            "list_nodes" => registry.register(tools::list_nodes::ListNodesTool::new(g)),
            "get_node" => registry.register(tools::get_node::GetNodeTool::new(g)),
            "list_tags" => registry.register(tools::list_tags::ListTagsTool::new(g)),
            "list_relationships" => {
                registry.register(tools::list_relationships::ListRelationshipsTool::new(g))
            }
            "validate_relationships" => registry
                .register(tools::validate_relationships::ValidateRelationshipsTool::new(g)),
            "add_node" => registry.register(tools::add_node::AddNodeTool::new(g)),
            "update_node" => registry.register(tools::update_node::UpdateNodeTool::new(g)),
            "delete_node" => registry.register(tools::delete_node::DeleteNodeTool::new(g)),
            _ => tracing::warn!("Unknown tool in policy: {}", name),
        }
    }

    registry
}
