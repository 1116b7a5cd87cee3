//! Shared application resources.

use std::sync::Arc;

use tracing::info;

use crate::agent::builtin::{SearchTool, SummaryTool};
use crate::agent::client::{create_embedder, create_provider};
use crate::agent::config::Settings;
use crate::agent::prompt::PromptSet;
use crate::agent::provider::LlmProvider;
use crate::agent::tool::ToolClient;
use crate::error::Result;
use crate::rag::Embedder;

/// Resources built once per process and shared by every request.
///
/// Read-only after construction; hand it around behind an `Arc`.
pub struct AppContext {
    /// Resolved settings.
    pub settings: Settings,
    /// Chat model.
    pub provider: Arc<dyn LlmProvider>,
    /// Query embedder; `None` disables vector retrieval.
    pub embedder: Option<Arc<dyn Embedder>>,
    /// Prompt templates.
    pub prompts: PromptSet,
    /// Connected tool client with the built-in tools registered.
    pub tool_client: Arc<ToolClient>,
}

impl AppContext {
    /// Builds every resource from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported provider, an unusable HTTP
    /// configuration, or an invalid tool server URL.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let provider = create_provider(&settings)?;
        let embedder = if settings.vector_store_uri.is_some() {
            Some(create_embedder(&settings)?)
        } else {
            None
        };
        let prompts = PromptSet::load(settings.prompt_dir.as_deref());
        let tool_client = build_tool_client(&settings)?;

        info!(
            provider = provider.name(),
            model = %settings.model,
            retrieval = embedder.is_some(),
            "application context ready"
        );
        Ok(Self {
            settings,
            provider,
            embedder,
            prompts,
            tool_client: Arc::new(tool_client),
        })
    }

    /// Builds a context around an existing provider, with default prompts,
    /// no embedder and the built-in tools.
    #[must_use]
    pub fn new(settings: Settings, provider: Arc<dyn LlmProvider>) -> Self {
        let mut tool_client = ToolClient::new(None);
        register_builtin_tools(&mut tool_client);
        Self {
            settings,
            provider,
            embedder: None,
            prompts: PromptSet::defaults(),
            tool_client: Arc::new(tool_client),
        }
    }

    /// Replaces the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Sets the query embedder.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .field("provider", &self.provider.name())
            .field("embedder", &self.embedder.as_ref().map(|e| e.model()))
            .field("tool_client", &self.tool_client)
            .finish_non_exhaustive()
    }
}

fn build_tool_client(settings: &Settings) -> Result<ToolClient> {
    let mut client = ToolClient::new(settings.tool_server_url.clone());
    client.connect()?;
    register_builtin_tools(&mut client);
    Ok(client)
}

fn register_builtin_tools(client: &mut ToolClient) {
    client.register(Arc::new(SearchTool));
    client.register(Arc::new(SummaryTool));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_without_store_has_no_embedder() {
        let settings = Settings::builder()
            .api_key("test")
            .vector_store_uri("")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let ctx = AppContext::from_settings(settings).unwrap_or_else(|_| unreachable!());
        assert!(ctx.embedder.is_none());
        assert!(ctx.tool_client.is_connected());
        assert_eq!(ctx.tool_client.available_tools(), vec!["search", "summary"]);
    }

    #[test]
    fn test_from_settings_with_store_builds_embedder() {
        let settings = Settings::builder()
            .api_key("test")
            .vector_store_uri("http://localhost:19530")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let ctx = AppContext::from_settings(settings).unwrap_or_else(|_| unreachable!());
        assert!(ctx.embedder.is_some());
    }

    #[test]
    fn test_invalid_tool_server_is_rejected() {
        let settings = Settings::builder()
            .api_key("test")
            .tool_server_url("::not a url::")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(AppContext::from_settings(settings).is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let settings = Settings::builder()
            .api_key("test")
            .provider("nope")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(AppContext::from_settings(settings).is_err());
    }
}
