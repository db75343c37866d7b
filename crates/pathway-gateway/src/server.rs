//! HTTP transport: JSON-RPC over `POST /mcp`, plus a health probe.

use crate::rpc::McpRouter;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn build_app(router: Arc<McpRouter>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(router)
}

pub async fn serve_http(router: Arc<McpRouter>, bind_addr: SocketAddr) -> anyhow::Result<()> {
    let shutdown = router.shutdown_token();
    let app = build_app(router.clone());

    info!("Pathway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  MCP endpoint: http://{}/mcp", bind_addr);
    info!("  Tools: {:?}", router.tools().list());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Body is taken as text so malformed JSON gets a JSON-RPC parse error instead of
/// an extractor rejection.
async fn mcp_handler(State(router): State<Arc<McpRouter>>, body: String) -> Response {
    match router.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_handler(State(router): State<Arc<McpRouter>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": "healthy",
            "name": router.meta().server.name,
            "version": env!("CARGO_PKG_VERSION"),
            "initialized": router.is_initialized(),
            "tools": router.tools().list().len(),
            "prompts": router.prompts().len(),
        })
        .to_string(),
    )
}
