use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::Node;
use crate::agent::config::Settings;
use crate::agent::executor::AgentExecutor;
use crate::error::WorkflowError;
use crate::rag::{Retriever, VectorRetriever};
use crate::workflow::context::AppContext;
use crate::workflow::router::Route;
use crate::workflow::state::{GraphState, StateUpdate};

/// A domain handler: an [`AgentExecutor`] bound to one route.
#[derive(Debug)]
pub struct DomainAgent {
    route: Route,
    executor: AgentExecutor,
}

impl DomainAgent {
    /// Wraps an executor for `route`.
    #[must_use]
    pub const fn new(route: Route, executor: AgentExecutor) -> Self {
        Self { route, executor }
    }

    /// Handler for `INTENT_A`: document retrieval plus the `search` tool.
    #[must_use]
    pub fn agent_a(ctx: &AppContext) -> Self {
        Self::build(ctx, Route::AgentA, &ctx.prompts.agent_a_system, "search")
    }

    /// Handler for `INTENT_B`: document retrieval plus the `summary` tool.
    #[must_use]
    pub fn agent_b(ctx: &AppContext) -> Self {
        Self::build(ctx, Route::AgentB, &ctx.prompts.agent_b_system, "summary")
    }

    fn build(ctx: &AppContext, route: Route, system_template: &str, tool: &str) -> Self {
        let executor = AgentExecutor::new(
            route.node_name(),
            Arc::clone(&ctx.provider),
            &ctx.settings,
            system_template,
            ctx.prompts.agent_user.clone(),
        )
        .with_retrievers(retrievers_for(ctx, route))
        .with_tools(Arc::clone(&ctx.tool_client), vec![tool.to_string()]);
        Self::new(route, executor)
    }

    /// Route this handler serves.
    #[must_use]
    pub const fn route(&self) -> Route {
        self.route
    }
}

/// Collection searched for `route`, falling back to the shared collection.
fn collection_for(settings: &Settings, route: Route) -> &str {
    let dedicated = match route {
        Route::AgentA => settings.agent_a_collection.as_deref(),
        Route::AgentB => settings.agent_b_collection.as_deref(),
        Route::Fallback => None,
    };
    dedicated.unwrap_or(&settings.collection_name)
}

/// Vector retrievers for a handler; empty when retrieval is disabled.
fn retrievers_for(ctx: &AppContext, route: Route) -> Vec<Arc<dyn Retriever>> {
    let (Some(uri), Some(embedder)) = (ctx.settings.vector_store_uri.as_ref(), ctx.embedder.as_ref())
    else {
        return Vec::new();
    };
    let retriever = VectorRetriever::new(
        format!("{}_docs", route.node_name()),
        uri.clone(),
        collection_for(&ctx.settings, route),
        Arc::clone(embedder),
    )
    .with_token(ctx.settings.vector_store_token.clone())
    .with_limit(ctx.settings.search_limit)
    .with_timeout(ctx.settings.timeout);
    debug!(
        retriever = retriever.name(),
        collection = retriever.collection(),
        "vector retriever configured"
    );
    vec![Arc::new(retriever)]
}

#[async_trait]
impl Node for DomainAgent {
    fn name(&self) -> &str {
        self.route.node_name()
    }

    async fn run(&self, state: &GraphState) -> Result<StateUpdate, WorkflowError> {
        self.executor.execute(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, test_settings};
    use crate::workflow::state::Intent;

    #[tokio::test]
    async fn test_agent_a_calls_search_tool() {
        let provider = Arc::new(ScriptedProvider::replying(&["done"]));
        let ctx = AppContext::new(test_settings(), provider.clone());
        let agent = DomainAgent::agent_a(&ctx);
        assert_eq!(agent.route(), Route::AgentA);

        let mut state = GraphState::new("find rust docs");
        state.intent = Some(Intent::IntentA);
        let update = agent.run(&state).await.unwrap_or_else(|_| unreachable!());
        assert_eq!(update.agent_output.as_deref(), Some("done"));

        let system = provider.requests()[0].messages[0].content.clone();
        assert!(system.contains("INTENT_A"));
        assert!(system.contains("no search backend configured"));
    }

    #[tokio::test]
    async fn test_agent_b_calls_summary_tool() {
        let provider = Arc::new(ScriptedProvider::replying(&["done"]));
        let ctx = AppContext::new(test_settings(), provider.clone());
        let agent = DomainAgent::agent_b(&ctx);

        agent
            .run(&GraphState::new("summarize this"))
            .await
            .unwrap_or_else(|_| unreachable!());

        let system = provider.requests()[0].messages[0].content.clone();
        assert!(system.contains("INTENT_B"));
        assert!(system.contains("\"summary\":\"summarize this\""));
    }

    #[test]
    fn test_collection_override_per_route() {
        let settings = Settings::builder()
            .api_key("k")
            .collection_name("shared")
            .agent_b_collection("release_notes")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(collection_for(&settings, Route::AgentA), "shared");
        assert_eq!(collection_for(&settings, Route::AgentB), "release_notes");
    }

    #[test]
    fn test_no_retrievers_without_store() {
        let provider = Arc::new(ScriptedProvider::replying(&[]));
        let ctx = AppContext::new(test_settings(), provider);
        assert!(retrievers_for(&ctx, Route::AgentA).is_empty());
    }
}
