use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ModelParams, Node};
use crate::agent::config::Settings;
use crate::agent::prompt::{PromptSet, render};
use crate::agent::provider::LlmProvider;
use crate::error::{WorkflowError, error_context};
use crate::workflow::state::{GraphState, Intent, StateUpdate};

/// Classifies the last message into an [`Intent`].
///
/// Never fails: model errors are recorded in `error` with the intent set
/// to [`Intent::Unknown`].
pub struct IntentClassifier {
    provider: Arc<dyn LlmProvider>,
    params: ModelParams,
    system_prompt: String,
    user_template: String,
}

impl IntentClassifier {
    /// Creates the classifier.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &Settings, prompts: &PromptSet) -> Self {
        Self {
            provider,
            params: ModelParams::from_settings(settings),
            system_prompt: prompts.classifier_system_prompt(),
            user_template: prompts.classifier_user.clone(),
        }
    }
}

#[async_trait]
impl Node for IntentClassifier {
    fn name(&self) -> &str {
        "classify"
    }

    async fn run(&self, state: &GraphState) -> Result<StateUpdate, WorkflowError> {
        let user_input = state.last_user_input();
        let request = self.params.request(
            &self.system_prompt,
            &render(&self.user_template, &[("user_input", user_input)]),
        );

        let response = match self.provider.chat(&request).await {
            Ok(response) => response,
            Err(e) => {
                let err = WorkflowError::classification(
                    e,
                    error_context([("user_input", user_input)]),
                );
                warn!(error = %err, "intent classification failed");
                return Ok(StateUpdate::default()
                    .with_intent(Intent::Unknown)
                    .with_error(Some(err.to_string())));
            }
        };

        let raw = response.content.trim();
        let intent = Intent::parse(raw).unwrap_or_else(|| {
            warn!(raw_output = raw, "unrecognised intent, using UNKNOWN");
            Intent::Unknown
        });
        info!(%intent, "intent classified");

        Ok(StateUpdate::default()
            .with_intent(intent)
            .with_error(None))
    }
}
