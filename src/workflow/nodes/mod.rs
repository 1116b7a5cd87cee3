//! Graph nodes.
//!
//! Every node reads the current [`GraphState`] and returns a
//! [`StateUpdate`]; the graph applies it before choosing the next step.

mod classifier;
mod domain;
mod fallback;
mod final_response;

pub use classifier::IntentClassifier;
pub use domain::DomainAgent;
pub use fallback::FallbackHandler;
pub use final_response::FinalResponder;

use async_trait::async_trait;

use super::state::{GraphState, StateUpdate};
use crate::agent::config::Settings;
use crate::agent::message::{ChatRequest, system_message, user_message};
use crate::error::WorkflowError;

/// A step of the workflow graph.
#[async_trait]
pub trait Node: Send + Sync {
    /// Node name used in logs.
    fn name(&self) -> &str;

    /// Computes the node's update for `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] when the node cannot produce an update.
    async fn run(&self, state: &GraphState) -> Result<StateUpdate, WorkflowError>;
}

/// Model settings shared by nodes that call the model directly.
#[derive(Debug, Clone)]
struct ModelParams {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ModelParams {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    fn request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![system_message(system), user_message(user)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            tools: Vec::new(),
        }
    }
}
