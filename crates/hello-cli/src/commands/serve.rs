//! Serve command: build the tool registry and run the server

use std::sync::Arc;

use clap::{Args, ValueEnum};
use hello_mcp::config::{DEFAULT_PORT, DEFAULT_SERVER_NAME};
use hello_mcp::{
    default_registry, run_mcp_server, McpServer, ServerInfo, ServerSettings, SseServerLoop,
};

/// Transport the server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// HTTP with server-sent events
    Sse,
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport to serve on
    #[arg(short, long, value_enum, default_value_t = TransportKind::Sse)]
    pub transport: TransportKind,

    /// Port for the SSE transport
    #[arg(short, long, env = "HELLO_MCP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Server name reported to clients
    #[arg(short, long, default_value = DEFAULT_SERVER_NAME)]
    pub name: String,
}

impl ServeArgs {
    pub fn settings(&self) -> ServerSettings {
        ServerSettings::default()
            .with_name(&self.name)
            .with_port(self.port)
    }
}

pub fn build_server(settings: &ServerSettings) -> anyhow::Result<McpServer> {
    let registry = default_registry()?;
    tracing::debug!("Registered {} tool(s)", registry.len());
    Ok(McpServer::new(ServerInfo::new(&settings.name), registry))
}

pub async fn run(args: &ServeArgs) -> anyhow::Result<()> {
    let settings = args.settings();
    let server = Arc::new(build_server(&settings)?);

    match args.transport {
        TransportKind::Sse => run_mcp_server(settings, &SseServerLoop::new(server)).await,
        TransportKind::Stdio => server.run_stdio().await,
    }
}
