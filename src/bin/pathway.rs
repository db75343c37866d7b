//! pathway: serve a workflow knowledge graph over MCP
//!
//! Usage:
//!   pathway                                → stdio transport, data in ./.pathway
//!   pathway --transport http --port 8080   → HTTP transport on POST /mcp
//!   pathway --read-only --data-dir docs/kg → only read tools are exposed

use clap::Parser;
use pathway::config::{Cli, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Argument errors exit 1 like any other startup failure; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let settings = Settings::resolve(&cli, |key| std::env::var(key).ok())?;
    let _guard = pathway::logging::init_tracing(&settings)?;
    tracing::debug!("settings: {:?}", settings);

    pathway::run(settings).await
}
