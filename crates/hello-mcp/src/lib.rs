//! Hello MCP - Model Context Protocol server for the greeting demo
//!
//! Provides the tool registry, JSON-RPC dispatch, and the stdio and SSE
//! transports the `hello` tool is served over.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod tools;
pub mod transport;

#[cfg(feature = "sse")]
pub mod sse;

pub use bootstrap::{run_mcp_server, ServerLoop, ALL_INTERFACES};
pub use config::ServerSettings;
pub use error::{McpError, McpResult};
pub use handlers::{ContentBlock, ToolCallResponse};
pub use server::{McpServer, ServerInfo};
pub use tools::{default_registry, Tool, ToolRegistry};

#[cfg(feature = "sse")]
pub use bootstrap::SseServerLoop;

#[cfg(feature = "sse")]
pub use sse::{run_sse_server, serve_sse};
