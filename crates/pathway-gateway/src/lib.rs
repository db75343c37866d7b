//! Pathway Gateway: MCP method routing over stdio and HTTP, plus the prompt library.

pub mod prompts;
pub mod rpc;
pub mod server;
pub mod stdio;

pub use prompts::{Prompt, PromptArgument, PromptInfo, PromptLibrary, RenderedPrompt};
pub use rpc::{McpRouter, RpcResult, DEFAULT_TIMEOUT};
pub use server::{build_app, serve_http};
pub use stdio::{run_stdio, serve_lines};
