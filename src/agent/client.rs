//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] and [`Embedder`]
//! implementations.

use std::sync::Arc;

use crate::agent::config::Settings;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::{OpenAiEmbedder, OpenAiProvider};
use crate::error::AgentError;
use crate::rag::Embedder;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default): OpenAI-compatible APIs via `async-openai`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(settings: &Settings) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match settings.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(settings)?)),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}

/// Creates the query [`Embedder`] for the configured provider.
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>, AgentError> {
    match settings.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(settings)?)),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
