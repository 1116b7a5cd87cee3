//! MCP server implementation for intent-router.
//!
//! Exposes the routing workflow as two MCP tools: `route` runs the whole
//! graph and `classify` stops after intent classification.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde_json::json;

use crate::workflow::{AppContext, GraphState, Intent, Workflow, route};

use super::params::{ClassifyParams, RouteParams};

fn to_content(value: &serde_json::Value) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn require_message(message: &str) -> Result<&str, McpError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(McpError::invalid_params("message is empty", None));
    }
    Ok(message)
}

/// intent-router MCP server.
#[derive(Clone)]
pub struct RouterMcpServer {
    tool_router: ToolRouter<Self>,
    ctx: Arc<AppContext>,
    workflow: Arc<Workflow>,
}

#[tool_router]
impl RouterMcpServer {
    /// Routes a message through classify, the matching handler and finalize.
    #[tool(
        name = "route",
        description = "Route a user message through the intent router. Classifies the intent (INTENT_A, INTENT_B or UNKNOWN), runs the matching agent with document retrieval and tools, and returns JSON with the final reply, the intent and the retrieved context."
    )]
    async fn route(
        &self,
        Parameters(params): Parameters<RouteParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = require_message(&params.message)?;
        let session_id = params
            .session_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let state = GraphState::new(message).with_session_id(session_id);

        let outcome = self
            .workflow
            .invoke(state)
            .await
            .map_err(|e| McpError::internal_error(format!("Workflow failed: {e}"), None))?;

        to_content(&json!({
            "session_id": outcome.state.session_id(),
            "intent": outcome.state.intent.map(Intent::as_str),
            "reply": outcome.reply(),
            "context": outcome.state.context,
            "error": outcome.state.error,
        }))
    }

    /// Classifies a message without running a handler.
    #[tool(
        name = "classify",
        description = "Classify a user message into INTENT_A, INTENT_B or UNKNOWN without running any agent. Returns JSON with the intent and the handler it routes to."
    )]
    async fn classify(
        &self,
        Parameters(params): Parameters<ClassifyParams>,
    ) -> Result<CallToolResult, McpError> {
        let message = require_message(&params.message)?;
        let state = self
            .workflow
            .classify(GraphState::new(message))
            .await
            .map_err(|e| McpError::internal_error(format!("Classification failed: {e}"), None))?;

        to_content(&json!({
            "intent": state.intent.map(Intent::as_str),
            "route": route(state.intent).node_name(),
            "error": state.error,
        }))
    }
}

#[tool_handler]
impl ServerHandler for RouterMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "intent-router".to_string(),
                title: Some("intent-router MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "intent-router: classifies a user message and answers it with the matching \
                 agent. Use `route` for a full answer and `classify` to inspect the routing \
                 decision."
                    .to_string(),
            ),
        }
    }
}

impl RouterMcpServer {
    /// Creates a server over a shared application context.
    #[must_use]
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let workflow = Arc::new(Workflow::new(&ctx));
        Self {
            tool_router: Self::tool_router(),
            ctx,
            workflow,
        }
    }

    /// Returns the shared application context.
    #[must_use]
    pub const fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, test_settings};

    fn server(replies: &[&str]) -> RouterMcpServer {
        let provider = Arc::new(ScriptedProvider::replying(replies));
        RouterMcpServer::new(Arc::new(AppContext::new(test_settings(), provider)))
    }

    #[test]
    fn test_info_advertises_tools_only() {
        let info = server(&[]).get_info();
        assert_eq!(info.server_info.name, "intent-router");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
    }

    #[tokio::test]
    async fn test_classify_tool() {
        let result = server(&["INTENT_B"])
            .classify(Parameters(ClassifyParams {
                message: "summarize this".to_string(),
            }))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_route_rejects_blank_message() {
        let result = server(&[])
            .route(Parameters(RouteParams {
                message: "  ".to_string(),
                session_id: None,
            }))
            .await;
        assert!(result.is_err());
    }
}
