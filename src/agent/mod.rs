//! Model-facing building blocks for the router.
//!
//! Provides the provider abstraction (backed by OpenAI-compatible APIs),
//! settings, prompt templates, the tool client and the agent executor that
//! the workflow nodes are built from.
//!
//! # Architecture
//!
//! ```text
//! AgentExecutor::execute(state)
//!   ├── Retrievers (vector search) → context
//!   ├── ToolClient (search, summary) → tool results
//!   └── LlmProvider::chat(system + user) → agent_output
//! ```

pub mod builtin;
pub mod client;
pub mod config;
pub mod executor;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod tool;

// Re-export key types
pub use config::{Settings, SettingsBuilder};
pub use executor::AgentExecutor;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use tool::{Tool, ToolCall, ToolClient, ToolDefinition};
