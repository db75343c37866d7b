//! Tests for pathway-graph: mutation protocol, invariants, and directory persistence

use pathway_core::ErrorKind;
use pathway_graph::*;
use std::collections::BTreeMap;
use std::path::Path;

fn ids(nodes: &[&Node]) -> Vec<String> {
    let mut ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    ids.sort();
    ids
}

fn linear_chain() -> GraphManager {
    let mut g = GraphManager::new();
    g.add(Node::new("A", "Checkout")).unwrap();
    g.add(Node::new("B", "Build").with_edge_ids("prerequisites", ["A"]))
        .unwrap();
    g.add(Node::new("C", "Test").with_edge_ids("prerequisites", ["B"]))
        .unwrap();
    g
}

fn write_relationships(root: &Path) {
    std::fs::write(
        root.join(RELATIONSHIPS_FILE),
        "relationships:\n\
         \x20 - name: prerequisites\n    description: Must be done first\n    direction: backward\n\
         \x20 - name: downstream_required\n    description: Must follow\n    direction: forward\n\
         \x20 - name: validates\n    description: Checks the subject\n    direction: none\n",
    )
    .unwrap();
}

/// Every persisted field equal and every resolved edge pointing at the node with the
/// recorded target ID.
fn assert_same_graph(left: &GraphManager, right: &GraphManager) {
    assert_eq!(left.len(), right.len());
    for node in left.list() {
        let other = right.get(&node.id).unwrap();
        assert_eq!(node, other);
        for (rel, edges) in other.resolved_edges() {
            for edge in edges {
                let target = right.node(edge.to).unwrap();
                assert_eq!(target.id, edge.target, "edge {}.{}", other.id, rel);
            }
        }
    }
}

// ===========================================================================
// Linear chain
// ===========================================================================

#[test]
fn linear_chain_resolves_to_live_nodes() {
    let g = linear_chain();
    let c = g.get("C").unwrap();
    let b = g.node(c.edges("prerequisites")[0].to).unwrap();
    assert_eq!(b.id, "B");
    let a = g.node(b.edges("prerequisites")[0].to).unwrap();
    assert!(std::ptr::eq(a, g.get("A").unwrap()));
    assert!(g.check_consistency().is_ok());
}

// ===========================================================================
// Self-loop rejection
// ===========================================================================

#[test]
fn self_loop_is_rejected() {
    let mut g = GraphManager::new();
    let err = g
        .add(Node::new("X", "Loop").with_edge_ids("prerequisites", ["X"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CycleDetected);
    assert_eq!(err.cycles().len(), 1);
    assert_eq!(err.cycles()[0].path, vec!["X".to_string(), "X".to_string()]);
    assert!(g.list().is_empty());
}

#[test]
fn self_loop_under_unregistered_relationship_is_rejected() {
    let mut g = GraphManager::new();
    g.add(Node::new("Y", "Y")).unwrap();
    let err = g
        .update(Node::new("Y", "Y").with_edge_ids("made_up", ["Y"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CycleDetected);
    assert_eq!(err.cycles()[0].relationship, "made_up");
}

// ===========================================================================
// Two-node cycle via update
// ===========================================================================

#[test]
fn update_creating_cycle_leaves_graph_untouched() {
    let mut g = GraphManager::new();
    g.add(Node::new("A", "A").with_summary("original")).unwrap();
    g.add(Node::new("B", "B").with_edge_ids("prerequisites", ["A"]))
        .unwrap();
    let before = g.get("A").unwrap().clone();

    let err = g
        .update(
            Node::new("A", "A")
                .with_summary("changed")
                .with_edge_ids("prerequisites", ["B"]),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CycleDetected);
    assert_eq!(
        err.cycles()[0].path,
        vec!["A".to_string(), "B".to_string(), "A".to_string()]
    );
    assert_eq!(g.get("A").unwrap(), &before);
    assert_eq!(g.get("A").unwrap().summary, "original");
}

// ===========================================================================
// Delete cascade
// ===========================================================================

#[test]
fn delete_purges_inbound_edges() {
    let mut g = GraphManager::new();
    g.add(Node::new("A", "A")).unwrap();
    g.add(Node::new("B", "B").with_edge_ids("prerequisites", ["A"]))
        .unwrap();
    g.add(
        Node::new("C", "C")
            .with_edge_ids("prerequisites", ["A"])
            .with_edge_ids("validates", ["B", "A"]),
    )
    .unwrap();

    let removed = g.delete("A").unwrap();
    assert_eq!(removed.id, "A");
    assert!(g.get("B").unwrap().get_edge_ids("prerequisites").is_empty());
    assert!(g.get("C").unwrap().get_edge_ids("prerequisites").is_empty());
    assert_eq!(
        g.get("C").unwrap().get_edge_ids("validates"),
        ["B".to_string()]
    );
    assert!(g.get("C").unwrap().edges("prerequisites").is_empty());
    assert_eq!(ids(&g.list()), ["B", "C"]);
    for node in g.list() {
        assert!(node.edge_ids().values().all(|t| !t.contains(&"A".to_string())));
    }
    assert!(g.check_consistency().is_ok());
}

#[test]
fn delete_last_node_leaves_empty_graph() {
    let mut g = GraphManager::new();
    g.add(Node::new("only", "Only").with_tags(["solo"])).unwrap();
    g.delete("only").unwrap();
    assert!(g.is_empty());
    assert!(g.list().is_empty());
    assert!(g.all_tags().is_empty());
}

#[test]
fn delete_errors() {
    let mut g = linear_chain();
    assert_eq!(g.delete("").unwrap_err().kind(), ErrorKind::Invalid);
    assert_eq!(g.delete("Z").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(g.len(), 3);
}

// ===========================================================================
// Tag queries
// ===========================================================================

#[test]
fn tag_index_queries() {
    let mut g = GraphManager::new();
    g.add(Node::new("n1", "1").with_tags(["api", "backend"])).unwrap();
    g.add(Node::new("n2", "2").with_tags(["api", "frontend"])).unwrap();
    g.add(Node::new("n3", "3").with_tags(["testing"])).unwrap();
    g.add(Node::new("n4", "4").with_tags(["backend"])).unwrap();

    assert_eq!(ids(&g.get_by_tag("api").unwrap()), ["n1", "n2"]);
    assert_eq!(ids(&g.get_by_tag("backend").unwrap()), ["n1", "n4"]);
    assert!(g.get_by_tag("unknown").unwrap().is_empty());
    assert_eq!(g.get_by_tag("").unwrap_err().kind(), ErrorKind::Invalid);

    let expected: BTreeMap<String, usize> = [
        ("api", 2),
        ("backend", 2),
        ("frontend", 1),
        ("testing", 1),
    ]
    .into_iter()
    .map(|(t, c)| (t.to_string(), c))
    .collect();
    assert_eq!(g.all_tags(), expected);
}

#[test]
fn tag_index_follows_updates() {
    let mut g = GraphManager::new();
    g.add(Node::new("n", "N").with_tags(["draft"])).unwrap();
    g.update(Node::new("n", "N").with_tags(["final"])).unwrap();
    assert!(g.get_by_tag("draft").unwrap().is_empty());
    assert_eq!(ids(&g.get_by_tag("final").unwrap()), ["n"]);
}

// ===========================================================================
// Reads
// ===========================================================================

#[test]
fn get_many_reports_every_missing_id() {
    let g = linear_chain();
    let result = g.get_many(&["A", "nope", "C", "gone"]);
    assert_eq!(ids(&result.found), ["A", "C"]);
    assert_eq!(result.missing, ["nope", "gone"]);
    let err = result.error().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("nope"));
    assert!(err.to_string().contains("gone"));

    assert!(g.get_many(&["A"]).error().is_none());
}

#[test]
fn add_rejects_empty_id() {
    let mut g = GraphManager::new();
    assert_eq!(
        g.add(Node::new("", "nameless")).unwrap_err().kind(),
        ErrorKind::Invalid
    );
    assert!(g.is_empty());
}

#[test]
fn update_unknown_node_is_not_found() {
    let mut g = linear_chain();
    assert_eq!(
        g.update(Node::new("Z", "Z")).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

// ===========================================================================
// Update pointer identity
// ===========================================================================

#[test]
fn inbound_edges_see_updated_node() {
    let mut g = linear_chain();
    g.update(Node::new("A", "Checkout v2").with_summary("shallow clone"))
        .unwrap();
    let b = g.get("B").unwrap();
    let a = g.node(b.edges("prerequisites")[0].to).unwrap();
    assert_eq!(a.name, "Checkout v2");
    assert!(std::ptr::eq(a, g.get("A").unwrap()));
}

// ===========================================================================
// Persist / reload parity
// ===========================================================================

#[test]
fn persist_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_relationships(dir.path());

    let mut store = GraphStore::open(dir.path()).unwrap();
    {
        let g = store.graph_mut();
        g.add(Node::new("A", "Checkout").with_tags(["git"])).unwrap();
        g.add(
            Node::new("B", "Build")
                .with_description("cargo build --release")
                .with_edge_ids("prerequisites", ["A"]),
        )
        .unwrap();
        g.add(
            Node::new("C", "Test")
                .with_tags(["ci", "testing"])
                .with_edge_ids("prerequisites", ["B"])
                .with_edge_ids("validates", ["B"]),
        )
        .unwrap();
    }
    let report = store.persist().unwrap();
    assert_eq!(report.written, 3);

    let reloaded = GraphStore::open(dir.path()).unwrap();
    assert_same_graph(store.graph(), reloaded.graph());
    assert_eq!(
        store.graph().relationships().list(),
        reloaded.graph().relationships().list()
    );
    let edge = &reloaded.graph().get("C").unwrap().edges("prerequisites")[0];
    assert!(std::ptr::eq(
        reloaded.graph().node(edge.to).unwrap(),
        reloaded.graph().get("B").unwrap()
    ));
    assert_eq!(
        edge.relationship.as_ref().unwrap().direction,
        Direction::Backward
    );
}

#[test]
fn persist_after_delete_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::open(dir.path()).unwrap();
    {
        let g = store.graph_mut();
        g.add(Node::new("A", "A")).unwrap();
        g.add(Node::new("B", "B").with_edge_ids("prerequisites", ["A"]))
            .unwrap();
    }
    store.persist().unwrap();
    assert!(store.nodes_dir().join("A.yaml").exists());

    store.graph_mut().delete("A").unwrap();
    let report = store.persist().unwrap();
    assert_eq!(report, PersistReport { written: 1, removed: 1 });
    assert!(!store.nodes_dir().join("A.yaml").exists());

    let reloaded = GraphStore::open(dir.path()).unwrap();
    assert_same_graph(store.graph(), reloaded.graph());
}

#[test]
fn open_creates_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("data");
    let store = GraphStore::open(&root).unwrap();
    assert!(root.is_dir());
    assert!(store.graph().is_empty());
}

#[test]
fn load_rejects_cycles_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let nodes = dir.path().join(NODES_DIR);
    std::fs::create_dir_all(&nodes).unwrap();
    std::fs::write(nodes.join("a.yaml"), "id: a\nedges:\n  prerequisites: [b]\n").unwrap();
    std::fs::write(nodes.join("b.yaml"), "id: b\nedges:\n  prerequisites: [a]\n").unwrap();

    let err = GraphStore::open(dir.path()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::CycleDetected);
    assert_eq!(err.cycles()[0].to_string(), "prerequisites: a -> b -> a");
}

#[test]
fn load_rejects_dangling_references() {
    let dir = tempfile::tempdir().unwrap();
    let nodes = dir.path().join(NODES_DIR);
    std::fs::create_dir_all(&nodes).unwrap();
    std::fs::write(nodes.join("a.yaml"), "id: a\nedges:\n  prerequisites: [ghost]\n").unwrap();

    let err = GraphStore::open(dir.path()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn malformed_relationships_do_not_block_graph_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(RELATIONSHIPS_FILE), "relationships: {{{").unwrap();
    let nodes = dir.path().join(NODES_DIR);
    std::fs::create_dir_all(&nodes).unwrap();
    std::fs::write(
        nodes.join("a.yaml"),
        "id: a\nname: A\ntags: [x]\ncreated_at: 2025-01-02T03:04:05Z\nupdated_at: 2025-01-02T03:04:05Z\n",
    )
    .unwrap();

    let store = GraphStore::open(dir.path()).unwrap();
    assert!(store.graph().relationships().is_empty());
    let a = store.graph().get("a").unwrap();
    assert_eq!(timestamp::format(&a.created_at), "2025-01-02T03:04:05Z");
    assert_eq!(ids(&store.graph().get_by_tag("x").unwrap()), ["a"]);
}

#[test]
fn unregistered_names_are_reported_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_relationships(dir.path());
    let mut store = GraphStore::open(dir.path()).unwrap();
    let g = store.graph_mut();
    g.add(Node::new("a", "A")).unwrap();
    g.add(Node::new("b", "B").with_edge_ids("blocks", ["a"])).unwrap();

    let unregistered: Vec<String> = g.unregistered_relationships().into_iter().collect();
    assert_eq!(unregistered, ["blocks"]);
    assert!(g.get("b").unwrap().edges("blocks")[0].relationship.is_none());
}
