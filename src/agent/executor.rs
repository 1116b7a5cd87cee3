//! Domain agent execution: retrieval, tool calls, then one model call.
//!
//! An [`AgentExecutor`] is configured once per handler with its prompt
//! templates, retrievers and tool names, and is then run against the
//! request state. Retrieval and tool failures abort the run with
//! [`WorkflowError::Execution`]; the workflow decides what happens next.
//!
//! The handler's tools are also bound to the model request. When the model
//! answers with tool calls instead of text, those calls are run and their
//! results become the agent output; the model is still called only once.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use super::config::Settings;
use super::message::{ChatRequest, system_message, user_message};
use super::prompt::render;
use super::provider::LlmProvider;
use super::tool::{ToolCall, ToolClient, ToolDefinition, tool_context};
use crate::error::{ExecutionStage, WorkflowError, error_context};
use crate::rag::Retriever;
use crate::workflow::{GraphState, StateUpdate};

/// Placeholder text when no context was retrieved.
const EMPTY_CONTEXT: &str = "none";

/// Runs one domain handler.
pub struct AgentExecutor {
    name: String,
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_template: String,
    user_template: String,
    retrievers: Vec<Arc<dyn Retriever>>,
    tool_client: Option<Arc<ToolClient>>,
    tools: Vec<String>,
}

impl AgentExecutor {
    /// Creates an executor with no retrievers or tools.
    ///
    /// `system_template` may use `{context}`; `user_template` may use
    /// `{user_input}`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        settings: &Settings,
        system_template: impl Into<String>,
        user_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            system_template: system_template.into(),
            user_template: user_template.into(),
            retrievers: Vec::new(),
            tool_client: None,
            tools: Vec::new(),
        }
    }

    /// Adds retrievers, run in the given order.
    #[must_use]
    pub fn with_retrievers(mut self, retrievers: Vec<Arc<dyn Retriever>>) -> Self {
        self.retrievers.extend(retrievers);
        self
    }

    /// Sets the tool client and the tools to call, in order.
    #[must_use]
    pub fn with_tools(mut self, client: Arc<ToolClient>, tools: Vec<String>) -> Self {
        self.tool_client = Some(client);
        self.tools = tools;
        self
    }

    /// Handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs retrieval, tool calls and the model call for the last message.
    ///
    /// Returns the agent output and the extended context. No messages are
    /// emitted.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Execution`] when a retriever or tool fails
    /// and [`WorkflowError::Model`] when the model call fails.
    pub async fn execute(&self, state: &GraphState) -> Result<StateUpdate, WorkflowError> {
        let user_input = state.last_user_input();
        info!(
            agent = %self.name,
            retrievers = self.retrievers.len(),
            tools = self.tools.len(),
            "agent execution start"
        );

        let mut context = state.context.clone();
        self.run_retrieval(user_input, &mut context).await?;
        let tool_results = self.run_tools(user_input).await?;
        let agent_output = self.run_model(user_input, &context, &tool_results).await?;

        info!(agent = %self.name, context_items = context.len(), "agent execution end");
        Ok(StateUpdate::default()
            .with_agent_output(agent_output)
            .with_context(context))
    }

    async fn run_retrieval(
        &self,
        query: &str,
        context: &mut Vec<String>,
    ) -> Result<(), WorkflowError> {
        for retriever in &self.retrievers {
            let name = retriever.name();
            info!(retriever = name, "retrieval start");
            let docs = retriever.retrieve(query).await.map_err(|e| {
                WorkflowError::execution(
                    ExecutionStage::Retrieval,
                    format!("retriever {name} failed"),
                    e,
                    error_context([("retriever", name), ("query", query)]),
                )
            })?;
            debug!(retriever = name, documents = docs.len(), "retrieval end");
            context.extend(docs.into_iter().map(|d| d.page_content));
        }
        Ok(())
    }

    async fn run_tools(&self, user_input: &str) -> Result<Vec<Value>, WorkflowError> {
        let Some(client) = self.tool_client.as_ref() else {
            return Ok(Vec::new());
        };

        let mut results = Vec::with_capacity(self.tools.len());
        for tool_name in &self.tools {
            info!(tool_name, "tool call start");
            let result = client
                .call(tool_name, json!({ "query": user_input }))
                .await
                .map_err(|e| {
                    WorkflowError::execution(
                        ExecutionStage::ToolCall,
                        format!("tool {tool_name} failed"),
                        e,
                        tool_context(tool_name, user_input),
                    )
                })?;
            results.push(result);
        }
        Ok(results)
    }

    async fn run_model(
        &self,
        user_input: &str,
        context: &[String],
        tool_results: &[Value],
    ) -> Result<String, WorkflowError> {
        let mut context_text = if context.is_empty() {
            EMPTY_CONTEXT.to_string()
        } else {
            context.join("\n")
        };
        if !tool_results.is_empty() {
            let rendered: Vec<String> = tool_results.iter().map(Value::to_string).collect();
            context_text.push_str("\n\n[Tool results]\n");
            context_text.push_str(&rendered.join("\n"));
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                system_message(&render(&self.system_template, &[("context", &context_text)])),
                user_message(&render(&self.user_template, &[("user_input", user_input)])),
            ],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            tools: self.bound_tools(),
        };

        let response = self.provider.chat(&request).await?;
        debug!(
            agent = %self.name,
            total_tokens = response.usage.total_tokens,
            tool_calls = response.tool_calls.len(),
            "model call complete"
        );
        if response.tool_calls.is_empty() {
            return Ok(response.content);
        }
        self.answer_tool_calls(response.content, &response.tool_calls)
            .await
    }

    /// Definitions of this handler's tools, in registry order.
    fn bound_tools(&self) -> Vec<ToolDefinition> {
        self.tool_client.as_ref().map_or_else(Vec::new, |client| {
            client
                .definitions()
                .into_iter()
                .filter(|d| self.tools.contains(&d.name))
                .collect()
        })
    }

    /// Runs the tool calls requested by the model and appends their results
    /// to whatever text came with them.
    async fn answer_tool_calls(
        &self,
        content: String,
        calls: &[ToolCall],
    ) -> Result<String, WorkflowError> {
        let Some(client) = self.tool_client.as_ref() else {
            return Ok(content);
        };

        let mut output = content;
        for call in calls {
            info!(tool_name = %call.name, call_id = %call.id, "model tool call");
            let args: Value = serde_json::from_str(&call.arguments).map_err(|e| {
                WorkflowError::execution(
                    ExecutionStage::ToolCall,
                    format!("tool {} got malformed arguments", call.name),
                    e,
                    tool_context(&call.name, &call.arguments),
                )
            })?;
            let result = client.call(&call.name, args).await.map_err(|e| {
                WorkflowError::execution(
                    ExecutionStage::ToolCall,
                    format!("tool {} failed", call.name),
                    e,
                    tool_context(&call.name, &call.arguments),
                )
            })?;
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&result.to_string());
        }
        Ok(output)
    }
}

impl std::fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let retrievers: Vec<&str> = self.retrievers.iter().map(|r| r.name()).collect();
        f.debug_struct("AgentExecutor")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("retrievers", &retrievers)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}
