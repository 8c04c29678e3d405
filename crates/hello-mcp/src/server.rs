//! MCP server implementation

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::error::McpError;
use crate::handlers::ToolCallRequest;
use crate::tools::ToolRegistry;
use crate::transport::{
    JsonRpcRequest, JsonRpcResponse, LineTransport, StdioTransport, JSONRPC_VERSION,
};

/// Protocol versions this server can speak, oldest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Identity reported to clients during `initialize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MCP server dispatching JSON-RPC requests to a tool registry
pub struct McpServer {
    info: ServerInfo,
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(info: ServerInfo, tools: ToolRegistry) -> Self {
        Self { info, tools }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Start the MCP server on stdio
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        tracing::info!("Starting MCP server on stdio");
        let mut transport = StdioTransport::stdio();
        self.serve_lines(&mut transport).await
    }

    /// Serve newline-delimited JSON-RPC until the reader hits EOF
    pub async fn serve_lines<R, W>(&self, transport: &mut LineTransport<R, W>) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(line) = transport.read_message().await? {
            let response = match JsonRpcRequest::parse(&line) {
                Ok(request) => {
                    tracing::debug!("Received request: {:?}", request.method);
                    self.handle_request(request)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::from_error(serde_json::Value::Null, &e))
                }
            };

            if let Some(response) = response {
                transport.write_response(&response).await?;
            }
        }

        tracing::info!("EOF on input, shutting down");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            let err = McpError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            ));
            return Some(JsonRpcResponse::from_error(id, &err));
        }

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize(&request.params)),
            "initialized" | "notifications/initialized" | "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(request.params),
            _ => Err(McpError::MethodNotFound(request.method.clone())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                tracing::debug!("Request {} failed: {}", request.method, e);
                JsonRpcResponse::from_error(id, &e)
            }
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "initialized" | "notifications/initialized" => tracing::debug!("Client initialized"),
            "notifications/cancelled" => tracing::debug!("Client cancelled a request"),
            other => tracing::debug!("Ignoring notification: {}", other),
        }
    }

    fn handle_initialize(&self, params: &serde_json::Value) -> serde_json::Value {
        let requested = params.get("protocolVersion").and_then(|v| v.as_str());
        let protocol_version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v) => v,
            _ => LATEST_PROTOCOL_VERSION,
        };

        if let Some(client) = params.get("clientInfo").and_then(|c| c.get("name")) {
            tracing::info!("Initializing session for client {} ({})", client, protocol_version);
        }

        serde_json::json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": self.info
        })
    }

    fn handle_tools_list(&self) -> serde_json::Value {
        serde_json::json!({ "tools": self.tools.list() })
    }

    fn handle_tools_call(&self, params: serde_json::Value) -> Result<serde_json::Value, McpError> {
        let params: ToolCallRequest =
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        tracing::debug!("Tool call: {} with args: {:?}", params.name, params.arguments);

        let response = self.tools.call(&params.name, params.arguments);
        Ok(serde_json::to_value(response)?)
    }
}
