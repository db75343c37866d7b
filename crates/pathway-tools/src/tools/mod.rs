//! Builtin graph tools: each file is one tool.

pub mod add_node;
pub mod delete_node;
pub mod get_node;
pub mod input;
pub mod list_nodes;
pub mod list_relationships;
pub mod list_tags;
pub mod update_node;
pub mod validate_relationships;

use crate::handle::Committed;
use crate::registry::ToolResult;
use pathway_core::ErrorKind;

/// Turn a committed mutation into tool output. A failed persist is still an error
/// for the caller, but the message says the in-memory change went through.
pub(crate) fn finish(committed: Committed<String>) -> ToolResult {
    match committed.persist_error {
        None => ToolResult::text(committed.value),
        Some(e) => ToolResult::error(
            ErrorKind::IoFailure,
            format!(
                "change applied in memory but not saved to disk ({}). \
                 It will be lost on restart unless a later change persists it.\n\n{}",
                e, committed.value
            ),
        ),
    }
}
