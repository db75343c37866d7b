//! pathway: workflow knowledge graph server
//!
//! Wires the graph store, tool registry and MCP router together behind the
//! configured transport.

pub mod config;
pub mod logging;

use config::{Settings, Transport};
use pathway_core::ServerMeta;
use pathway_gateway::{run_stdio, serve_http, McpRouter, PromptLibrary};
use pathway_graph::GraphStore;
use pathway_tools::{create_default_registry, create_read_only_registry, GraphHandle};
use std::sync::Arc;
use tracing::info;

/// Open the data root and build the router for it.
pub fn build_router(settings: &Settings) -> anyhow::Result<McpRouter> {
    let store = GraphStore::open(&settings.data_dir)?;
    let meta = ServerMeta::load(store.root());
    let prompts = PromptLibrary::load(&store.prompts_dir());

    let unregistered = store.graph().unregistered_relationships();
    if !unregistered.is_empty() {
        tracing::warn!("unregistered relationship names in use: {:?}", unregistered);
    }

    let graph = GraphHandle::new(store, meta.naming.node.clone());
    let tools = if settings.read_only {
        create_read_only_registry(graph)
    } else {
        create_default_registry(graph)
    };
    info!(
        "Registered tools: {:?}{}",
        tools.list(),
        if settings.read_only { " (read-only)" } else { "" }
    );
    info!("Loaded {} prompts", prompts.len());

    Ok(McpRouter::new(tools, prompts, meta).with_timeout(settings.request_timeout()))
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let router = Arc::new(build_router(&settings)?);

    let shutdown = router.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            shutdown.shutdown();
        }
    });

    match settings.transport {
        Transport::Stdio => {
            let token = router.shutdown_token();
            tokio::select! {
                result = run_stdio(&router) => result,
                _ = token.cancelled() => Ok(()),
            }
        }
        Transport::Http => serve_http(router.clone(), settings.bind_addr()?).await,
    }
}
