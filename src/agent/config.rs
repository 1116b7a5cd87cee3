//! Process settings with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The binary loads settings once and hands them to
//! [`AppContext`](crate::workflow::AppContext); nothing reads the environment
//! after that.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default chat model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default embedding model used for vector search.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default vector store endpoint.
const DEFAULT_VECTOR_STORE_URI: &str = "http://localhost:19530";
/// Default collection searched by retrievers.
const DEFAULT_COLLECTION: &str = "default_collection";
/// Default maximum tokens per model response.
const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default number of documents per retriever search.
const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Router settings.
#[derive(Clone)]
pub struct Settings {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Chat model used by every node.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per model response.
    pub max_tokens: u32,
    /// HTTP timeout for model and vector store requests.
    pub timeout: Duration,
    /// Vector store endpoint. `None` disables retrieval.
    pub vector_store_uri: Option<String>,
    /// Bearer token for the vector store.
    pub vector_store_token: Option<String>,
    /// Collection searched by the built-in retrievers.
    pub collection_name: String,
    /// Collection for the `INTENT_A` agent; `None` uses `collection_name`.
    pub agent_a_collection: Option<String>,
    /// Collection for the `INTENT_B` agent; `None` uses `collection_name`.
    pub agent_b_collection: Option<String>,
    /// Embedding model used to vectorize queries.
    pub embedding_model: String,
    /// Documents requested per retriever search.
    pub search_limit: usize,
    /// Tool server URL handed to the tool client on connect.
    pub tool_server_url: Option<String>,
    /// Directory containing prompt template files.
    ///
    /// When set, prompts are loaded from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing file.
    pub prompt_dir: Option<PathBuf>,
}

impl Settings {
    /// Creates a new builder for `Settings`.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Creates settings from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("vector_store_uri", &self.vector_store_uri)
            .field("collection_name", &self.collection_name)
            .field("agent_a_collection", &self.agent_a_collection)
            .field("agent_b_collection", &self.agent_b_collection)
            .field("embedding_model", &self.embedding_model)
            .field("search_limit", &self.search_limit)
            .field("tool_server_url", &self.tool_server_url)
            .field("prompt_dir", &self.prompt_dir)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    vector_store_uri: Option<String>,
    vector_store_token: Option<String>,
    collection_name: Option<String>,
    agent_a_collection: Option<String>,
    agent_b_collection: Option<String>,
    embedding_model: Option<String>,
    search_limit: Option<usize>,
    tool_server_url: Option<String>,
    prompt_dir: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from `lookup`, which maps a variable name to
    /// its value.
    #[must_use]
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider.is_none() {
            self.provider = lookup("ROUTER_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty());
        }
        if self.base_url.is_none() {
            self.base_url = lookup("OPENAI_BASE_URL");
        }
        if self.model.is_none() {
            self.model = lookup("OPENAI_MODEL_NAME");
        }
        if self.temperature.is_none() {
            self.temperature = lookup("OPENAI_TEMPERATURE").and_then(|v| v.parse().ok());
        }
        if self.max_tokens.is_none() {
            self.max_tokens = lookup("ROUTER_MAX_TOKENS").and_then(|v| v.parse().ok());
        }
        if self.timeout.is_none() {
            self.timeout = lookup("ROUTER_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs);
        }
        if self.vector_store_uri.is_none() {
            self.vector_store_uri = lookup("MILVUS_URI");
        }
        if self.vector_store_token.is_none() {
            self.vector_store_token = lookup("MILVUS_TOKEN");
        }
        if self.collection_name.is_none() {
            self.collection_name = lookup("MILVUS_COLLECTION_NAME");
        }
        if self.agent_a_collection.is_none() {
            self.agent_a_collection = lookup("MILVUS_AGENT_A_COLLECTION");
        }
        if self.agent_b_collection.is_none() {
            self.agent_b_collection = lookup("MILVUS_AGENT_B_COLLECTION");
        }
        if self.embedding_model.is_none() {
            self.embedding_model = lookup("EMBEDDING_MODEL_NAME");
        }
        if self.search_limit.is_none() {
            self.search_limit = lookup("ROUTER_SEARCH_LIMIT").and_then(|v| v.parse().ok());
        }
        if self.tool_server_url.is_none() {
            self.tool_server_url = lookup("MCP_SERVER_URL");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = lookup("ROUTER_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the chat model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens per response.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the vector store URI. An empty string disables retrieval.
    #[must_use]
    pub fn vector_store_uri(mut self, uri: impl Into<String>) -> Self {
        self.vector_store_uri = Some(uri.into());
        self
    }

    /// Sets the vector store token.
    #[must_use]
    pub fn vector_store_token(mut self, token: impl Into<String>) -> Self {
        self.vector_store_token = Some(token.into());
        self
    }

    /// Sets the collection searched by retrievers.
    #[must_use]
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Sets the collection searched by the `INTENT_A` agent.
    #[must_use]
    pub fn agent_a_collection(mut self, name: impl Into<String>) -> Self {
        self.agent_a_collection = Some(name.into());
        self
    }

    /// Sets the collection searched by the `INTENT_B` agent.
    #[must_use]
    pub fn agent_b_collection(mut self, name: impl Into<String>) -> Self {
        self.agent_b_collection = Some(name.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Sets the per-retriever search limit.
    #[must_use]
    pub const fn search_limit(mut self, n: usize) -> Self {
        self.search_limit = Some(n);
        self
    }

    /// Sets the tool server URL.
    #[must_use]
    pub fn tool_server_url(mut self, url: impl Into<String>) -> Self {
        self.tool_server_url = Some(url.into());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`AgentError::InvalidConfig`] for a temperature outside `0.0..=2.0`
    /// or a zero search limit.
    pub fn build(self) -> Result<Settings, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        let temperature = self.temperature.unwrap_or(0.0);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AgentError::InvalidConfig {
                key: "temperature".to_string(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let search_limit = self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if search_limit == 0 {
            return Err(AgentError::InvalidConfig {
                key: "search_limit".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let vector_store_uri = match self.vector_store_uri {
            Some(uri) if uri.trim().is_empty() => None,
            Some(uri) => Some(uri),
            None => Some(DEFAULT_VECTOR_STORE_URI.to_string()),
        };

        Ok(Settings {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            vector_store_uri,
            vector_store_token: self.vector_store_token.filter(|t| !t.is_empty()),
            collection_name: self
                .collection_name
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            agent_a_collection: self.agent_a_collection.filter(|c| !c.is_empty()),
            agent_b_collection: self.agent_b_collection.filter(|c| !c.is_empty()),
            embedding_model: self
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            search_limit,
            tool_server_url: self.tool_server_url.filter(|u| !u.is_empty()),
            prompt_dir: self.prompt_dir,
        })
    }
}
