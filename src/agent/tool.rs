//! Tool definitions and the tool-call client.
//!
//! A [`Tool`] is a named capability with a JSON argument schema. The
//! [`ToolClient`] keeps a registry of tools and dispatches calls by name;
//! domain agents receive a shared client plus the list of tool names they
//! are allowed to call.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ErrorContext, WorkflowError, error_context};

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the registry key).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// What the tool does.
    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn args_schema(&self) -> Value;

    /// Definition suitable for binding to a model request.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.args_schema(),
        }
    }

    /// Runs the tool.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ToolCall`] when the tool fails.
    async fn call(&self, args: Value) -> Result<Value, WorkflowError>;
}

/// Registry of tools reachable through one tool server.
#[derive(Default)]
pub struct ToolClient {
    server_url: Option<String>,
    tools: BTreeMap<String, Arc<dyn Tool>>,
    connected: bool,
}

impl ToolClient {
    /// Creates a client for the given server URL (`None` for local tools only).
    #[must_use]
    pub fn new(server_url: Option<String>) -> Self {
        Self {
            server_url,
            tools: BTreeMap::new(),
            connected: false,
        }
    }

    /// Connects to the tool server.
    ///
    /// Local tools need no connection, so only the URL is validated.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ToolCall`] if the server URL is not a valid
    /// absolute URL.
    pub fn connect(&mut self) -> Result<(), WorkflowError> {
        if let Some(url) = self.server_url.as_deref() {
            reqwest::Url::parse(url).map_err(|e| {
                WorkflowError::tool(
                    format!("cannot connect to tool server {url}"),
                    Some(Box::new(e)),
                    error_context([("server_url", url)]),
                )
            })?;
        }
        info!(server_url = ?self.server_url, "tool client connected");
        self.connected = true;
        Ok(())
    }

    /// Whether [`ToolClient::connect`] succeeded.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!(tool = name, "tool registered");
        self.tools.insert(name, tool);
    }

    /// Looks up a registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ToolCall`] listing the available tools if
    /// `name` is not registered.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Tool>, WorkflowError> {
        self.tools.get(name).ok_or_else(|| {
            let available = self.available_tools().join(", ");
            WorkflowError::tool(
                format!("unregistered tool: {name}"),
                None,
                error_context([("tool_name", name), ("available", available.as_str())]),
            )
        })
    }

    /// Calls a registered tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ToolCall`] for unregistered tools or when the
    /// tool itself fails.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, WorkflowError> {
        let tool = self.get(name)?;
        debug!(tool = name, %args, "tool call start");
        let rendered_args = args.to_string();
        match tool.call(args).await {
            Ok(result) => {
                debug!(tool = name, "tool call end");
                Ok(result)
            }
            Err(e @ WorkflowError::ToolCall { .. }) => Err(e),
            Err(e) => Err(WorkflowError::tool(
                format!("tool {name} failed"),
                Some(Box::new(e)),
                error_context([("tool_name", name), ("args", rendered_args.as_str())]),
            )),
        }
    }

    /// Names of all registered tools, sorted.
    #[must_use]
    pub fn available_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Definitions of all registered tools, for binding to a model request.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }
}

impl std::fmt::Debug for ToolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolClient")
            .field("server_url", &self.server_url)
            .field("tools", &self.available_tools())
            .field("connected", &self.connected)
            .finish()
    }
}

/// Extracts a string argument, defaulting to empty.
pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Context map for a failed tool invocation.
pub(crate) fn tool_context(name: &str, input: &str) -> ErrorContext {
    error_context([("tool_name", name), ("input", input)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its arguments."
        }

        fn args_schema(&self) -> Value {
            json!({"type": "object", "properties": {"query": {"type": "string"}}})
        }

        async fn call(&self, args: Value) -> Result<Value, WorkflowError> {
            Ok(json!({ "echo": args }))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails."
        }

        fn args_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, _args: Value) -> Result<Value, WorkflowError> {
            Err(WorkflowError::store("backend down", None, ErrorContext::new()))
        }
    }

    #[tokio::test]
    async fn test_call_registered_tool() {
        let mut client = ToolClient::new(None);
        client.register(Arc::new(EchoTool));
        let result = client
            .call("echo", json!({"query": "hi"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(result["echo"]["query"], "hi");
    }

    #[tokio::test]
    async fn test_unregistered_tool_is_an_error() {
        let mut client = ToolClient::new(None);
        client.register(Arc::new(EchoTool));
        let err = client.call("missing", json!({})).await;
        let Err(err) = err else { unreachable!() };
        assert!(matches!(err, WorkflowError::ToolCall { .. }));
        let ctx = err.context().unwrap_or_else(|| unreachable!());
        assert_eq!(ctx.get("tool_name").map(String::as_str), Some("missing"));
        assert_eq!(ctx.get("available").map(String::as_str), Some("echo"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_wrapped_with_args() {
        let mut client = ToolClient::new(None);
        client.register(Arc::new(BrokenTool));
        let Err(err) = client.call("broken", json!({"query": "q"})).await else {
            unreachable!()
        };
        assert!(matches!(err, WorkflowError::ToolCall { .. }));
        let ctx = err.context().unwrap_or_else(|| unreachable!());
        assert!(ctx.get("args").is_some_and(|a| a.contains("\"q\"")));
    }

    #[test]
    fn test_connect_validates_server_url() {
        let mut client = ToolClient::new(Some("not a url".to_string()));
        assert!(client.connect().is_err());
        assert!(!client.is_connected());

        let mut client = ToolClient::new(Some("http://localhost:8931/mcp".to_string()));
        assert!(client.connect().is_ok());
        assert!(client.is_connected());
    }

    #[test]
    fn test_definitions_follow_registry() {
        let mut client = ToolClient::new(None);
        client.register(Arc::new(EchoTool));
        client.register(Arc::new(BrokenTool));
        let defs = client.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(client.available_tools(), vec!["broken", "echo"]);
        assert!(defs.iter().all(|d| d.parameters["type"] == "object"));
    }
}
