//! pathway-graph: typed multigraph of workflow knowledge
//!
//! Nodes connect through named relationships; each relationship name is kept acyclic.
//! The graph lives in memory behind `GraphManager` and is mirrored to a directory of
//! YAML files by `GraphStore`.

pub mod cycles;
pub mod manager;
pub mod node;
pub mod relationship;
pub mod store;
pub mod tags;
pub mod timestamp;

pub use manager::{GetMany, GraphManager};
pub use node::{validate_id, Edge, Node, NodeRef};
pub use relationship::{Direction, RegistryLoad, Relationship, RelationshipRegistry};
pub use store::{
    load_graph, load_relationships, persist_graph, write_node_file, GraphStore, PersistReport,
    NODES_DIR, PROMPTS_DIR, RELATIONSHIPS_FILE,
};
pub use tags::TagIndex;
