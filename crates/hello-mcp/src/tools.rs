//! MCP tool definitions and registry

use std::collections::BTreeMap;
use std::sync::Arc;

use hello_core::HelloArgs;
use serde::Serialize;

use crate::error::{McpError, McpResult};
use crate::handlers::ToolCallResponse;

/// MCP tool definition
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Synchronous tool handler. Receives the raw `arguments` object.
pub type ToolHandler = Arc<dyn Fn(serde_json::Value) -> ToolCallResponse + Send + Sync>;

struct RegisteredTool {
    tool: Tool,
    handler: ToolHandler,
}

/// Tools exposed by a server, keyed by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register<F>(&mut self, tool: Tool, handler: F) -> McpResult<()>
    where
        F: Fn(serde_json::Value) -> ToolCallResponse + Send + Sync + 'static,
    {
        if self.tools.contains_key(&tool.name) {
            return Err(McpError::DuplicateTool(tool.name));
        }
        tracing::debug!("Registered tool: {}", tool.name);
        self.tools.insert(
            tool.name.clone(),
            RegisteredTool {
                tool,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Tool definitions, sorted by name
    pub fn list(&self) -> Vec<&Tool> {
        self.tools.values().map(|t| &t.tool).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn call(&self, name: &str, arguments: serde_json::Value) -> ToolCallResponse {
        match self.tools.get(name) {
            Some(registered) => (registered.handler)(arguments),
            None => ToolCallResponse::error(format!("Unknown tool: {}", name)),
        }
    }
}

/// Definition of the `hello` tool
pub fn hello_tool() -> Tool {
    Tool {
        name: "hello".to_string(),
        description: "Says hello".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "title": "helloArguments",
            "properties": {
                "name": {
                    "anyOf": [{"type": "string"}, {"type": "null"}],
                    "default": null,
                    "title": "Name",
                    "description": "Who to greet (default: 'stranger')"
                }
            }
        }),
    }
}

fn call_hello(arguments: serde_json::Value) -> ToolCallResponse {
    match HelloArgs::from_value(arguments) {
        Ok(args) => ToolCallResponse::text(args.greet()),
        Err(e) => ToolCallResponse::error(e.to_string()),
    }
}

pub fn register_hello(registry: &mut ToolRegistry) -> McpResult<()> {
    registry.register(hello_tool(), call_hello)
}

/// Registry holding every tool this server ships with
pub fn default_registry() -> McpResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_hello(&mut registry)?;
    Ok(registry)
}
