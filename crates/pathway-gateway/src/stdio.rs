//! stdio transport: newline-delimited JSON-RPC on stdin/stdout.
//!
//! stdout carries protocol messages only; logs go to stderr.

use crate::rpc::McpRouter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serve requests from `reader` until EOF, writing one response line per request.
pub async fn serve_lines<R, W>(router: &McpRouter, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(response) = router.handle_message(line).await else {
            continue;
        };
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    debug!("stdin closed");
    Ok(())
}

pub async fn run_stdio(router: &McpRouter) -> anyhow::Result<()> {
    info!("serving MCP on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(router, stdin, stdout).await?;
    Ok(())
}
