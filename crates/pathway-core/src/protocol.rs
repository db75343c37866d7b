//! MCP wire protocol: JSON-RPC 2.0 envelopes
//!
//! Wire format:
//!
//! Client → Server (request):
//!   { "jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": { "name": "get_node", "arguments": { "id": "build" } } }
//!
//! Client → Server (notification, no id):
//!   { "jsonrpc": "2.0", "method": "notifications/initialized" }
//!
//! Server → Client (response):
//!   { "jsonrpc": "2.0", "id": 7, "result": { ... } }
//!   { "jsonrpc": "2.0", "id": 7, "error": { "code": -32601, "message": "Method not found: foo" } }

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision advertised in `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const NOT_INITIALIZED: i32 = -32002;

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// JSON-RPC request or notification from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent for notifications. Numbers and strings are echoed back verbatim.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Params as an object, or an empty object when absent.
    pub fn params_or_empty(&self) -> Value {
        self.params
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    /// Successful response with a result value.
    pub fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn err(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Shorthand for an unparsable request body.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::err(None, PARSE_ERROR, message)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// RPC error detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// tools/call content
// ---------------------------------------------------------------------------

/// A text content block inside a `tools/call` or `prompts/get` result.
pub fn text_content(text: impl Into<String>) -> Value {
    serde_json::json!({ "type": "text", "text": text.into() })
}
