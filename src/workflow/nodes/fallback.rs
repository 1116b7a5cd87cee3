use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::Node;
use crate::agent::executor::AgentExecutor;
use crate::agent::prompt::ERROR_MESSAGE;
use crate::error::WorkflowError;
use crate::workflow::context::AppContext;
use crate::workflow::router::Route;
use crate::workflow::state::{GraphState, StateUpdate};

/// Handles unknown intents and failed requests.
///
/// With `error` set it answers with [`ERROR_MESSAGE`] and makes no model
/// call. Otherwise the request is treated as a general question and
/// answered directly.
#[derive(Debug)]
pub struct FallbackHandler {
    executor: AgentExecutor,
}

impl FallbackHandler {
    /// Creates the handler from the application context.
    #[must_use]
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            executor: AgentExecutor::new(
                Route::Fallback.node_name(),
                Arc::clone(&ctx.provider),
                &ctx.settings,
                ctx.prompts.fallback_system.clone(),
                ctx.prompts.fallback_user.clone(),
            ),
        }
    }
}

#[async_trait]
impl Node for FallbackHandler {
    fn name(&self) -> &str {
        Route::Fallback.node_name()
    }

    async fn run(&self, state: &GraphState) -> Result<StateUpdate, WorkflowError> {
        if let Some(ref error) = state.error {
            warn!(error, "answering with the fixed error message");
            return Ok(StateUpdate::default().with_agent_output(ERROR_MESSAGE));
        }
        info!("answering general query directly");
        self.executor.execute(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, test_settings};
    use crate::workflow::state::Intent;

    fn handler(provider: &Arc<ScriptedProvider>) -> FallbackHandler {
        FallbackHandler::new(&AppContext::new(test_settings(), provider.clone()))
    }

    fn unknown_state() -> GraphState {
        let mut state = GraphState::new("hi there");
        state.intent = Some(Intent::Unknown);
        state
    }

    #[tokio::test]
    async fn test_error_skips_model_call() {
        let provider = Arc::new(ScriptedProvider::replying(&["should not be used"]));
        let mut state = unknown_state();
        state.error = Some("classification failed".to_string());

        let update = handler(&provider)
            .run(&state)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(update.agent_output.as_deref(), Some(ERROR_MESSAGE));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_general_query_answers_directly() {
        let provider = Arc::new(ScriptedProvider::replying(&["Hello!"]));
        let update = handler(&provider)
            .run(&unknown_state())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(update.agent_output.as_deref(), Some("Hello!"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_error_and_no_error_replies_differ() {
        let provider = Arc::new(ScriptedProvider::replying(&["Hello!"]));
        let handler = handler(&provider);

        let plain = handler
            .run(&unknown_state())
            .await
            .unwrap_or_else(|_| unreachable!());
        let mut failed_state = unknown_state();
        failed_state.error = Some("boom".to_string());
        let failed = handler
            .run(&failed_state)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_ne!(plain.agent_output, failed.agent_output);
    }
}
