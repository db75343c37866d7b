//! Shared access to the graph store for tools.
//!
//! Reads take the lock shared; mutations take it exclusively and persist before
//! releasing it, so two writers never interleave a mutate/persist pair.

use pathway_core::{Error, NodeNaming, Result};
use pathway_graph::{GraphManager, GraphStore, PersistReport};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, error};

/// Outcome of a committed mutation. `persist_error` is set when the in-memory
/// change succeeded but writing it to disk did not.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub report: Option<PersistReport>,
    pub persist_error: Option<Error>,
}

#[derive(Clone)]
pub struct GraphHandle {
    store: Arc<RwLock<GraphStore>>,
    naming: Arc<NodeNaming>,
}

impl GraphHandle {
    pub fn new(store: GraphStore, naming: NodeNaming) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            naming: Arc::new(naming),
        }
    }

    pub fn naming(&self) -> &NodeNaming {
        &self.naming
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.store.read().await
    }

    /// Run `f` against the graph under the write lock, then persist. An error from `f`
    /// leaves the graph untouched and skips the persist. The mutate and persist pair
    /// does blocking file I/O, so on a multi-thread runtime it runs via `block_in_place`.
    pub async fn mutate<T, F>(&self, f: F) -> Result<Committed<T>>
    where
        F: FnOnce(&mut GraphManager) -> Result<T>,
    {
        let mut store = self.store.write().await;
        let (value, persisted) = blocking(|| {
            let value = f(store.graph_mut())?;
            Ok::<_, Error>((value, store.persist()))
        })?;
        match persisted {
            Ok(report) => {
                debug!("persisted: {} written, {} removed", report.written, report.removed);
                Ok(Committed {
                    value,
                    report: Some(report),
                    persist_error: None,
                })
            }
            Err(e) => {
                error!("graph changed in memory but persist failed: {}", e);
                Ok(Committed {
                    value,
                    report: None,
                    persist_error: Some(e),
                })
            }
        }
    }
}

/// `block_in_place` panics on a current-thread runtime, where the call simply runs inline.
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}
