//! MCP router: dispatches JSON-RPC method calls to handlers
//!
//! Each MCP method (initialize, tools/list, tools/call, prompts/get, ...) is handled
//! by a dedicated function. Transports hand every decoded request to `McpRouter::handle`
//! and write back whatever response it returns.

use crate::prompts::PromptLibrary;
use pathway_core::{
    text_content, ErrorKind, JsonRpcRequest, JsonRpcResponse, ServerMeta, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, MCP_PROTOCOL_VERSION, NOT_INITIALIZED,
};
use pathway_tools::{ToolRegistry, ToolResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result type for RPC handlers.
pub type RpcResult = Result<Value, (i32, String)>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct McpRouter {
    tools: Arc<ToolRegistry>,
    prompts: PromptLibrary,
    meta: ServerMeta,
    initialized: AtomicBool,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl McpRouter {
    pub fn new(tools: ToolRegistry, prompts: PromptLibrary, meta: ServerMeta) -> Self {
        Self {
            tools: Arc::new(tools),
            prompts,
            meta,
            initialized: AtomicBool::new(false),
            timeout: DEFAULT_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    /// Outer limit on a single `tools/call`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    pub fn meta(&self) -> &ServerMeta {
        &self.meta
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Token cancelled on shutdown. Tool calls that have not reached their commit
    /// stop early; committed ones run to completion.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Decode one JSON-RPC message and handle it. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => return Some(JsonRpcResponse::parse_error(format!("Parse error: {}", e))),
        };
        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::err(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let method = request.method.as_str();
        let params = request.params_or_empty();
        debug!("rpc: {}", method);

        if request.is_notification() {
            self.handle_notification(method);
            return None;
        }

        let result = self.route(method, params).await;
        Some(to_response(request.id, result))
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::SeqCst);
                info!("client initialized");
            }
            "notifications/cancelled" => debug!("client cancelled a request"),
            other => debug!("ignoring notification {}", other),
        }
    }

    /// Route an RPC method call to the appropriate handler.
    pub async fn route(&self, method: &str, params: Value) -> RpcResult {
        match method {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(json!({})),
            _ if !self.is_initialized() => {
                Err((NOT_INITIALIZED, "Server not initialized".to_string()))
            }
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(params).await,
            "prompts/list" => Ok(self.handle_prompts_list()),
            "prompts/get" => self.handle_prompts_get(params),
            _ => Err((
                pathway_core::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        }
    }

    // -----------------------------------------------------------------------
    // initialize
    // -----------------------------------------------------------------------

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.meta.server.name,
                "title": self.meta.server.display_name,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "prompts": { "listChanged": false },
            },
            "instructions": self.meta.server.instructions,
        })
    }

    // -----------------------------------------------------------------------
    // tools/list, tools/call
    // -----------------------------------------------------------------------

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.tools.definitions() })
    }

    async fn handle_tools_call(&self, params: Value) -> RpcResult {
        let name = params["name"]
            .as_str()
            .ok_or_else(|| (INVALID_PARAMS, "Missing required param: name".to_string()))?
            .to_string();
        if self.tools.get(&name).is_none() {
            return Err((INVALID_PARAMS, format!("Unknown tool: {}", name)));
        }
        let args = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(v @ Value::Object(_)) => v.clone(),
            Some(_) => {
                return Err((INVALID_PARAMS, "arguments must be an object".to_string()));
            }
        };

        // The call runs on its own task so that a timeout only abandons the wait.
        let tools = self.tools.clone();
        let cancel = self.shutdown.child_token();
        let task_name = name.clone();
        let handle =
            tokio::spawn(async move { tools.execute_cancellable(&task_name, args, cancel).await });

        let result = match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("tool {} panicked: {}", name, e);
                return Err((INTERNAL_ERROR, format!("Tool {} failed: {}", name, e)));
            }
            Err(_) => {
                warn!("tool {} timed out after {:?}", name, self.timeout);
                // No dedicated kind for timeouts; `reason` tells them apart from disk failures.
                let result = ToolResult::error(
                    ErrorKind::IoFailure,
                    format!(
                        "timeout: {} timed out after {}ms and may still complete in the background",
                        name,
                        self.timeout.as_millis()
                    ),
                );
                let mut body = tool_result_json(&result);
                body["error"]["reason"] = json!("timeout");
                return Ok(body);
            }
        };

        Ok(tool_result_json(&result))
    }

    // -----------------------------------------------------------------------
    // prompts/list, prompts/get
    // -----------------------------------------------------------------------

    fn handle_prompts_list(&self) -> Value {
        json!({ "prompts": self.prompts.list() })
    }

    fn handle_prompts_get(&self, params: Value) -> RpcResult {
        let name = params["name"]
            .as_str()
            .ok_or_else(|| (INVALID_PARAMS, "Missing required param: name".to_string()))?;
        let mut args = HashMap::new();
        if let Some(obj) = params.get("arguments").and_then(Value::as_object) {
            for (k, v) in obj {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                args.insert(k.clone(), value);
            }
        }

        let rendered = self
            .prompts
            .get(name, &args)
            .map_err(|e| (INVALID_PARAMS, e.to_string()))?;
        Ok(json!({
            "description": rendered.description,
            "messages": [
                { "role": "user", "content": text_content(rendered.text) }
            ]
        }))
    }
}

/// `tools/call` result body. Errors carry a machine-readable kind next to the text.
pub fn tool_result_json(result: &ToolResult) -> Value {
    match result {
        ToolResult::Text(text) => json!({
            "content": [text_content(text.clone())],
            "isError": false,
        }),
        ToolResult::Error { kind, message } => json!({
            "content": [text_content(result.to_content_string())],
            "isError": true,
            "error": { "kind": kind, "message": message },
        }),
    }
}

/// Convert an RPC result to a JSON-RPC response.
pub fn to_response(id: Option<Value>, result: RpcResult) -> JsonRpcResponse {
    match result {
        Ok(value) => JsonRpcResponse::ok(id, value),
        Err((code, message)) => JsonRpcResponse::err(id, code, message),
    }
}
