//! Directory-backed graph store.
//!
//! Layout under the data root:
//!
//! ```text
//! relationships.yaml   relationship definitions (optional)
//! nodes/<id>.yaml      one file per node
//! prompts/             prompt library (not part of the graph)
//! mcp.yaml             server metadata (not part of the graph)
//! ```
//!
//! Each node file is written to a temporary file in the same directory and renamed
//! over the target, so a crash never leaves a torn node file. The directory as a whole
//! is not written atomically.

use crate::manager::GraphManager;
use crate::node::Node;
use crate::relationship::RelationshipRegistry;
use pathway_core::{Error, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const RELATIONSHIPS_FILE: &str = "relationships.yaml";
pub const NODES_DIR: &str = "nodes";
pub const PROMPTS_DIR: &str = "prompts";
const NODE_EXT: &str = "yaml";

/// Files touched by one persist pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistReport {
    pub written: usize,
    pub removed: usize,
}

pub struct GraphStore {
    root: PathBuf,
    graph: GraphManager,
}

impl GraphStore {
    /// Open a data root, creating it if missing, and load the graph from it.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let relationships = load_relationships(&root.join(RELATIONSHIPS_FILE));
        let graph = load_graph(&root.join(NODES_DIR), relationships)?;
        info!(
            "opened graph at {} ({} nodes, {} relationships)",
            root.display(),
            graph.len(),
            graph.relationships().len()
        );
        Ok(Self { root, graph })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn nodes_dir(&self) -> PathBuf {
        self.root.join(NODES_DIR)
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join(PROMPTS_DIR)
    }

    pub fn graph(&self) -> &GraphManager {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphManager {
        &mut self.graph
    }

    /// Write every live node to `nodes/` and remove files of nodes that are gone.
    pub fn persist(&self) -> Result<PersistReport> {
        persist_graph(&self.graph, &self.nodes_dir())
    }
}

/// Load relationship definitions. Never fails: a missing file yields an empty
/// registry, a malformed one is logged and ignored.
pub fn load_relationships(path: &Path) -> RelationshipRegistry {
    let mut registry = RelationshipRegistry::new();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return registry,
        Err(e) => {
            warn!("cannot read {}: {}", path.display(), e);
            return registry;
        }
    };
    match registry.load_yaml(&content) {
        Ok(report) => {
            debug!(
                "loaded {} relationships from {} ({} skipped)",
                report.registered,
                path.display(),
                report.skipped.len()
            );
        }
        Err(e) => warn!("ignoring {}: {}", path.display(), e),
    }
    registry
}

/// Node files in `dir`, sorted by file name.
fn node_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == NODE_EXT) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every `*.yaml` node file, then check cycles, resolve edges, and index tags.
/// Any failure discards the partially loaded graph.
pub fn load_graph(dir: &Path, relationships: RelationshipRegistry) -> Result<GraphManager> {
    let mut graph = GraphManager::with_relationships(relationships);
    for path in node_files(dir)? {
        let content = std::fs::read_to_string(&path)?;
        let node: Node = serde_yaml::from_str(&content).map_err(|e| {
            warn!("cannot parse {}: {}", path.display(), e);
            Error::from(e)
        })?;
        node.validate()?;
        graph.insert_unchecked(node)?;
    }
    graph.check_cycles()?;
    graph.resolve_edges()?;
    graph.rebuild_tag_index();
    Ok(graph)
}

/// Serialize one node to `<dir>/<id>.yaml` via write-and-rename.
pub fn write_node_file(dir: &Path, node: &Node) -> Result<PathBuf> {
    let target = dir.join(format!("{}.{}", node.id, NODE_EXT));
    let yaml = serde_yaml::to_string(node)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(yaml.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| Error::from(e.error))?;
    Ok(target)
}

/// Write every node, then remove files of nodes that are gone. A node that fails to
/// write does not stop the others; all failures come back as one error at the end.
pub fn persist_graph(graph: &GraphManager, dir: &Path) -> Result<PersistReport> {
    std::fs::create_dir_all(dir)?;
    let mut report = PersistReport::default();
    let mut failures = Vec::new();

    // Failed nodes still count as live so their last good file is kept.
    let mut live = HashSet::new();
    for node in graph.list() {
        live.insert(node.id.as_str());
        match write_node_file(dir, node) {
            Ok(_) => report.written += 1,
            Err(e) => {
                warn!("cannot write node '{}': {}", node.id, e);
                failures.push(format!("{}: {}", node.id, e));
            }
        }
    }

    for path in node_files(dir)? {
        let stale = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| !live.contains(stem));
        if !stale {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed stale node file {}", path.display());
                report.removed += 1;
            }
            Err(e) => {
                warn!("cannot remove {}: {}", path.display(), e);
                failures.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    debug!(
        "persisted {} nodes to {} ({} removed, {} failed)",
        report.written,
        dir.display(),
        report.removed,
        failures.len()
    );
    if !failures.is_empty() {
        return Err(Error::IoError(std::io::Error::other(format!(
            "{} file(s) not saved: {}",
            failures.len(),
            failures.join("; ")
        ))));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::ErrorKind;

    #[test]
    fn write_node_file_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        write_node_file(dir.path(), &Node::new("build", "Build")).unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["build.yaml".to_string()]);
    }

    #[test]
    fn non_yaml_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();
        write_node_file(dir.path(), &Node::new("a", "A")).unwrap();
        let g = load_graph(dir.path(), RelationshipRegistry::new()).unwrap();
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn unparsable_node_file_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "id: [oops").unwrap();
        let err = load_graph(dir.path(), RelationshipRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn duplicate_ids_across_files_fail_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.yaml"), "id: same\nname: One\n").unwrap();
        std::fs::write(dir.path().join("two.yaml"), "id: same\nname: Two\n").unwrap();
        let err = load_graph(dir.path(), RelationshipRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn missing_relationships_file_is_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_relationships(&dir.path().join(RELATIONSHIPS_FILE)).is_empty());
    }

    #[test]
    fn one_unwritable_node_does_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = GraphManager::new();
        for id in ["a", "b", "c"] {
            g.add(Node::new(id, id.to_uppercase())).unwrap();
        }
        // A directory squatting on a.yaml makes the rename for `a` fail.
        std::fs::create_dir(dir.path().join("a.yaml")).unwrap();
        std::fs::write(dir.path().join("gone.yaml"), "id: gone\nname: Gone\n").unwrap();

        for _ in 0..2 {
            let err = persist_graph(&g, dir.path()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IoFailure);
            assert!(err.to_string().contains("a:"));
            assert!(dir.path().join("b.yaml").is_file());
            assert!(dir.path().join("c.yaml").is_file());
            assert!(!dir.path().join("gone.yaml").exists());
        }

        std::fs::remove_dir(dir.path().join("a.yaml")).unwrap();
        let report = persist_graph(&g, dir.path()).unwrap();
        assert_eq!(report.written, 3);
        let reloaded = load_graph(dir.path(), RelationshipRegistry::new()).unwrap();
        assert_eq!(reloaded.len(), 3);
    }
}
