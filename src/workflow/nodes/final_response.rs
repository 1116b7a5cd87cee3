use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{ModelParams, Node};
use crate::agent::message::assistant_message;
use crate::agent::prompt::{FALLBACK_MESSAGE, render};
use crate::agent::provider::LlmProvider;
use crate::error::WorkflowError;
use crate::workflow::context::AppContext;
use crate::workflow::state::{GraphState, StateUpdate};

/// Turns the handler output into the single reply message.
pub struct FinalResponder {
    provider: Arc<dyn LlmProvider>,
    params: ModelParams,
    system_template: String,
    user_prompt: String,
}

impl FinalResponder {
    /// Creates the node from the application context.
    #[must_use]
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            provider: Arc::clone(&ctx.provider),
            params: ModelParams::from_settings(&ctx.settings),
            system_template: ctx.prompts.final_system.clone(),
            user_prompt: ctx.prompts.final_user.clone(),
        }
    }
}

#[async_trait]
impl Node for FinalResponder {
    fn name(&self) -> &str {
        "finalize"
    }

    async fn run(&self, state: &GraphState) -> Result<StateUpdate, WorkflowError> {
        if state.agent_output.is_empty() && state.context.is_empty() {
            warn!("nothing to answer from, using the fallback message");
            return Ok(StateUpdate::default().with_message(assistant_message(FALLBACK_MESSAGE)));
        }

        let context_text = if state.context.is_empty() {
            "none".to_string()
        } else {
            state.context.join("\n")
        };
        let system = render(
            &self.system_template,
            &[
                ("agent_output", state.agent_output.as_str()),
                ("context", context_text.as_str()),
            ],
        );

        let response = self
            .provider
            .chat(&self.params.request(&system, &self.user_prompt))
            .await?;
        debug!(chars = response.content.len(), "final response generated");

        Ok(StateUpdate::default().with_message(assistant_message(&response.content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::Role;
    use crate::test_support::{ScriptedProvider, test_settings};

    fn responder(provider: &Arc<ScriptedProvider>) -> FinalResponder {
        FinalResponder::new(&AppContext::new(test_settings(), provider.clone()))
    }

    #[tokio::test]
    async fn test_empty_state_uses_fallback_without_model_call() {
        let provider = Arc::new(ScriptedProvider::replying(&["unused"]));
        let update = responder(&provider)
            .run(&GraphState::new("hello"))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(update.messages.len(), 1);
        assert_eq!(update.messages[0].content, FALLBACK_MESSAGE);
        assert_eq!(update.messages[0].role, Role::Assistant);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_output_and_context_reach_the_prompt() {
        let provider = Arc::new(ScriptedProvider::replying(&["final"]));
        let mut state = GraphState::new("hello");
        state.agent_output = "draft answer".to_string();
        state.context = vec!["doc one".to_string(), "doc two".to_string()];

        let update = responder(&provider)
            .run(&state)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(update.messages.len(), 1);
        assert_eq!(update.messages[0].content, "final");

        let system = provider.requests()[0].messages[0].content.clone();
        assert!(system.contains("draft answer"));
        assert!(system.contains("doc one\ndoc two"));
    }

    #[tokio::test]
    async fn test_placeholder_text_in_agent_output_is_kept() {
        let provider = Arc::new(ScriptedProvider::replying(&["final"]));
        let mut state = GraphState::new("how do I format strings?");
        state.agent_output = "Use f\"{context}\" to interpolate.".to_string();
        state.context = vec!["SECRET_DOC".to_string()];

        responder(&provider)
            .run(&state)
            .await
            .unwrap_or_else(|_| unreachable!());

        let system = provider.requests()[0].messages[0].content.clone();
        assert!(system.contains("Use f\"{context}\" to interpolate."));
        assert_eq!(system.matches("SECRET_DOC").count(), 1);
    }

    #[tokio::test]
    async fn test_context_only_still_calls_model() {
        let provider = Arc::new(ScriptedProvider::replying(&["from context"]));
        let mut state = GraphState::new("hello");
        state.context = vec!["doc".to_string()];

        let update = responder(&provider)
            .run(&state)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(update.messages[0].content, "from context");
        assert_eq!(provider.calls(), 1);
    }
}
