//! Tool-level tests: registry policy, rendering through tools, and persistence.

use pathway_core::{ErrorKind, NodeNaming};
use pathway_graph::GraphStore;
use pathway_tools::{
    create_default_registry, create_read_only_registry, GraphHandle, ToolRegistry, ToolResult,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const RELATIONSHIPS: &str = "\
relationships:
  - name: prerequisites
    description: Must be done first
    direction: backward
  - name: downstream_required
    description: Must follow
    direction: forward
";

fn setup() -> (TempDir, GraphHandle, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("relationships.yaml"), RELATIONSHIPS).unwrap();
    let store = GraphStore::open(dir.path()).unwrap();
    let handle = GraphHandle::new(store, NodeNaming::default());
    let registry = create_default_registry(handle.clone());
    (dir, handle, registry)
}

fn text(result: ToolResult) -> String {
    match result {
        ToolResult::Text(s) => s,
        other => panic!("expected text, got {:?}", other),
    }
}

async fn add(registry: &ToolRegistry, args: serde_json::Value) -> ToolResult {
    registry.execute("add_node", args).await
}

// ===========================================================================
// Registry policy
// ===========================================================================

#[tokio::test]
async fn default_registry_lists_all_tools_sorted() {
    let (_dir, _handle, registry) = setup();
    assert_eq!(
        registry.list(),
        vec![
            "add_node",
            "delete_node",
            "get_node",
            "list_nodes",
            "list_relationships",
            "list_tags",
            "update_node",
            "validate_relationships",
        ]
    );
    let defs = registry.definitions();
    let add_def = defs.iter().find(|d| d.name == "add_node").unwrap();
    assert_eq!(add_def.input_schema["required"], json!(["id", "name"]));
}

#[tokio::test]
async fn read_only_registry_hides_mutations() {
    let (_dir, handle, _registry) = setup();
    let registry = create_read_only_registry(handle);
    assert_eq!(registry.list(), registry.list_read_only());
    assert!(registry.get("add_node").is_none());

    let result = registry.execute("delete_node", json!({"id": "x"})).await;
    assert_eq!(result.kind(), Some(ErrorKind::NotFound));
}

// ===========================================================================
// Mutations
// ===========================================================================

#[tokio::test]
async fn add_then_get_renders_related_nodes() {
    let (_dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "setup", "name": "Setup"})).await);
    text(add(&registry, json!({"id": "deploy", "name": "Deploy", "summary": "Ship it"})).await);
    let out = text(
        add(
            &registry,
            json!({
                "id": "build",
                "name": "Build",
                "tags": ["ci"],
                "edges": {
                    "prerequisites": ["setup"],
                    "downstream_required": ["deploy"]
                }
            }),
        )
        .await,
    );
    assert!(out.starts_with("Added node `build`."));

    let md = text(registry.execute("get_node", json!({"id": "build"})).await);
    let before = md.find("## Before").unwrap();
    let title = md.find("# Build (`build`)").unwrap();
    let after = md.find("## After").unwrap();
    assert!(before < title && title < after);
    assert!(md.contains("- **Deploy** (`deploy`): Ship it"));

    let setup_md = text(registry.execute("get_node", json!({"id": "setup"})).await);
    assert!(setup_md.contains("- **Build** (`build`) via `prerequisites`"));
}

#[tokio::test]
async fn add_writes_node_file() {
    let (dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "lint", "name": "Lint"})).await);
    let content = std::fs::read_to_string(dir.path().join("nodes/lint.yaml")).unwrap();
    assert!(content.contains("id: lint"));
    assert!(content.contains("name: Lint"));
}

#[tokio::test]
async fn add_rejects_cycle_with_kind() {
    let (_dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "a", "name": "A"})).await);
    let result = add(
        &registry,
        json!({"id": "b", "name": "B", "edges": {"prerequisites": ["b"]}}),
    )
    .await;
    assert_eq!(result.kind(), Some(ErrorKind::CycleDetected));
    assert!(result.to_content_string().contains("b -> b"));
}

#[tokio::test]
async fn add_duplicate_and_dangling_fail() {
    let (_dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "a", "name": "A"})).await);
    let dup = add(&registry, json!({"id": "a", "name": "Again"})).await;
    assert_eq!(dup.kind(), Some(ErrorKind::AlreadyExists));

    let dangling = add(
        &registry,
        json!({"id": "b", "name": "B", "edges": {"prerequisites": ["ghost"]}}),
    )
    .await;
    assert_eq!(dangling.kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn add_with_bad_input_is_invalid() {
    let (_dir, _handle, registry) = setup();
    let missing_name = add(&registry, json!({"id": "a"})).await;
    assert_eq!(missing_name.kind(), Some(ErrorKind::Invalid));
    let bad_id = add(&registry, json!({"id": "../escape", "name": "X"})).await;
    assert_eq!(bad_id.kind(), Some(ErrorKind::Invalid));
}

#[tokio::test]
async fn update_keeps_created_at_and_replaces_fields() {
    let (_dir, handle, registry) = setup();
    text(add(&registry, json!({"id": "a", "name": "A", "tags": ["old"]})).await);
    let created = handle.read().await.graph().get("a").unwrap().created_at;

    let out = text(
        registry
            .execute("update_node", json!({"id": "a", "name": "A2", "tags": ["new"]}))
            .await,
    );
    assert!(out.starts_with("Updated node `a`."));

    let store = handle.read().await;
    let node = store.graph().get("a").unwrap();
    assert_eq!(node.name, "A2");
    assert_eq!(node.created_at, created);
    assert!(store.graph().get_by_tag("old").unwrap().is_empty());
}

#[tokio::test]
async fn update_unknown_is_not_found() {
    let (_dir, _handle, registry) = setup();
    let result = registry
        .execute("update_node", json!({"id": "nope", "name": "N"}))
        .await;
    assert_eq!(result.kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn delete_reports_purged_referrers_and_removes_file() {
    let (dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "a", "name": "A"})).await);
    text(add(&registry, json!({"id": "b", "name": "B", "edges": {"prerequisites": ["a"]}})).await);

    let out = text(registry.execute("delete_node", json!({"id": "a"})).await);
    assert!(out.contains("Removed references from 1 nodes: `b`"));
    assert!(!dir.path().join("nodes/a.yaml").exists());

    let b = std::fs::read_to_string(dir.path().join("nodes/b.yaml")).unwrap();
    assert!(!b.contains("prerequisites"));
}

#[tokio::test]
async fn persist_failure_keeps_memory_change() {
    let (dir, handle, registry) = setup();
    // A regular file where the nodes directory should be makes persist fail.
    std::fs::write(dir.path().join("nodes"), "not a directory").unwrap();

    let result = add(&registry, json!({"id": "a", "name": "A"})).await;
    assert_eq!(result.kind(), Some(ErrorKind::IoFailure));
    assert!(result.to_content_string().contains("applied in memory"));
    assert!(handle.read().await.graph().contains("a"));
}

#[tokio::test]
async fn over_long_id_is_rejected_and_later_adds_persist() {
    let (dir, _handle, registry) = setup();
    let long_id = "x".repeat(300);
    let result = add(&registry, json!({"id": long_id, "name": "Long"})).await;
    assert_eq!(result.kind(), Some(ErrorKind::Invalid));

    text(add(&registry, json!({"id": "b", "name": "B"})).await);
    assert!(dir.path().join("nodes/b.yaml").is_file());
    let reloaded = GraphStore::open(dir.path()).unwrap();
    assert_eq!(reloaded.graph().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_serialized_and_persisted() {
    let (dir, handle, registry) = setup();
    let registry = Arc::new(registry);
    text(add(&registry, json!({"id": "root", "name": "Root"})).await);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let args = json!({
                "id": format!("n{:02}", i),
                "name": format!("Step {}", i),
                "tags": [if i % 2 == 0 { "even" } else { "odd" }],
                "edges": {"prerequisites": ["root"]},
            });
            add(&registry, args).await
        }));
    }
    for task in tasks {
        let result = task.await.unwrap();
        assert!(!result.is_error(), "{}", result.to_content_string());
    }

    let files = std::fs::read_dir(dir.path().join("nodes")).unwrap().count();
    assert_eq!(files, 21);

    let live = handle.read().await;
    let reloaded = GraphStore::open(dir.path()).unwrap();
    assert_eq!(reloaded.graph().len(), live.graph().len());
    for node in live.graph().list() {
        assert_eq!(reloaded.graph().get(&node.id).unwrap(), node);
    }
}

// ===========================================================================
// Reads
// ===========================================================================

#[tokio::test]
async fn list_nodes_filters_by_tag_union() {
    let (_dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "a", "name": "A", "tags": ["x"]})).await);
    text(add(&registry, json!({"id": "b", "name": "B", "tags": ["y"]})).await);
    text(add(&registry, json!({"id": "c", "name": "C", "tags": ["x", "y"]})).await);
    text(add(&registry, json!({"id": "d", "name": "D"})).await);

    let all = text(registry.execute("list_nodes", json!({})).await);
    assert!(all.starts_with("# Nodes (4)"));

    let union = text(registry.execute("list_nodes", json!({"tags": ["x", "y"]})).await);
    assert!(union.starts_with("# Nodes tagged x, y (3)"));
    assert!(!union.contains("`d`"));

    let empty = registry.execute("list_nodes", json!({"tags": [""]})).await;
    assert_eq!(empty.kind(), Some(ErrorKind::Invalid));
}

#[tokio::test]
async fn list_tags_counts_nodes() {
    let (_dir, _handle, registry) = setup();
    text(add(&registry, json!({"id": "a", "name": "A", "tags": ["x", "x"]})).await);
    text(add(&registry, json!({"id": "b", "name": "B", "tags": ["x"]})).await);
    let md = text(registry.execute("list_tags", json!({})).await);
    assert!(md.contains("| `x` | 2 |"));
}

#[tokio::test]
async fn relationship_tools_report_registry() {
    let (_dir, _handle, registry) = setup();
    let md = text(registry.execute("list_relationships", json!({})).await);
    assert!(md.contains("| `prerequisites` | backward | Must be done first |"));

    text(add(&registry, json!({"id": "a", "name": "A"})).await);
    text(add(&registry, json!({"id": "b", "name": "B", "edges": {"see_also": ["a"]}})).await);
    let report = text(registry.execute("validate_relationships", json!({})).await);
    assert!(report.contains("- `see_also`"));
}

#[tokio::test]
async fn get_node_missing_id_is_invalid() {
    let (_dir, _handle, registry) = setup();
    let result = registry.execute("get_node", json!({})).await;
    assert_eq!(result.kind(), Some(ErrorKind::Invalid));
}

#[tokio::test]
async fn cancelled_before_start_leaves_graph_unchanged() {
    let (_dir, handle, registry) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();
    // Hold the read lock so the mutation cannot reach its commit.
    let guard = handle.read().await;
    let result = registry
        .execute_cancellable("add_node", json!({"id": "a", "name": "A"}), cancel)
        .await;
    drop(guard);
    assert!(result.is_error());
    assert!(!handle.read().await.graph().contains("a"));
}
