//! Pathway Core - error taxonomy, MCP wire types, and server metadata

pub mod error;
pub mod protocol;
pub mod server_meta;

pub use error::{CyclePath, Error, ErrorKind, Result};
pub use protocol::*;
pub use server_meta::{Naming, NodeNaming, ServerInfo, ServerMeta, SERVER_META_FILE};
