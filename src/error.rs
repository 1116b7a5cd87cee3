//! Error types for the router.
//!
//! Errors are layered: [`AgentError`] covers configuration and model-client
//! failures, [`WorkflowError`] covers everything a node can report, and
//! [`Error`] is the crate-level type returned by CLI commands.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Boxed underlying cause attached to a workflow error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Key/value details describing where an error happened
/// (offending component, query, tool input, ...).
pub type ErrorContext = BTreeMap<String, String>;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by CLI commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or model-client failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Failure raised while running the workflow.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Command-level failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure (stdin, prompt files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by CLI command handling.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not be executed.
    #[error("command failed: {0}")]
    ExecutionFailed(String),

    /// Output could not be rendered in the requested format.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),

    /// The command received invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from configuration and the model client.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured.
    #[error("API key missing: set OPENAI_API_KEY or pass one explicitly")]
    ApiKeyMissing,

    /// A configuration value could not be used.
    #[error("invalid configuration for {key}: {message}")]
    InvalidConfig {
        /// Offending setting.
        key: String,
        /// What is wrong with it.
        message: String,
    },

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name from configuration.
        name: String,
    },

    /// The provider rejected or failed the request.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error message from the client.
        message: String,
        /// HTTP status when known.
        status: Option<u16>,
    },

    /// The provider answered with something we could not use.
    #[error("failed to parse model response: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// Raw response content.
        content: String,
    },
}

/// Pipeline stage in which an agent execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    /// Document retrieval.
    Retrieval,
    /// Tool invocation.
    ToolCall,
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieval => f.write_str("retrieval"),
            Self::ToolCall => f.write_str("tool call"),
        }
    }
}

/// Errors reported by workflow nodes and their collaborators.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Intent classification failed.
    #[error("intent classification failed: {message}")]
    Classification {
        /// Human-readable message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
        /// Where it happened.
        context: ErrorContext,
    },

    /// A domain agent failed during retrieval or tool invocation.
    #[error("agent execution failed during {stage}: {message}")]
    Execution {
        /// Stage that failed.
        stage: ExecutionStage,
        /// Human-readable message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
        /// Where it happened.
        context: ErrorContext,
    },

    /// The vector store could not be reached or answered with an error.
    #[error("vector store error: {message}")]
    StoreConnection {
        /// Human-readable message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
        /// Where it happened.
        context: ErrorContext,
    },

    /// A tool could not be found or failed.
    #[error("tool call failed: {message}")]
    ToolCall {
        /// Human-readable message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
        /// Where it happened.
        context: ErrorContext,
    },

    /// The model client failed. Not recovered by the workflow.
    #[error(transparent)]
    Model(#[from] AgentError),
}

impl WorkflowError {
    /// Creates a classification error wrapping `cause`.
    pub fn classification(cause: impl Into<BoxError>, context: ErrorContext) -> Self {
        let source = cause.into();
        Self::Classification {
            message: source.to_string(),
            source: Some(source),
            context,
        }
    }

    /// Creates an execution error for `stage` wrapping `cause`.
    pub fn execution(
        stage: ExecutionStage,
        message: impl Into<String>,
        cause: impl Into<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::Execution {
            stage,
            message: message.into(),
            source: Some(cause.into()),
            context,
        }
    }

    /// Creates a vector store error with an optional cause.
    pub fn store(message: impl Into<String>, source: Option<BoxError>, context: ErrorContext) -> Self {
        Self::StoreConnection {
            message: message.into(),
            source,
            context,
        }
    }

    /// Creates a tool error with an optional cause.
    pub fn tool(message: impl Into<String>, source: Option<BoxError>, context: ErrorContext) -> Self {
        Self::ToolCall {
            message: message.into(),
            source,
            context,
        }
    }

    /// Returns the context map, empty for model errors.
    #[must_use]
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Classification { context, .. }
            | Self::Execution { context, .. }
            | Self::StoreConnection { context, .. }
            | Self::ToolCall { context, .. } => Some(context),
            Self::Model(_) => None,
        }
    }

    /// Whether the workflow may divert to the fallback handler instead of
    /// aborting the request.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Model(_))
    }

    /// Renders the error followed by every underlying cause, joined by `": "`.
    ///
    /// A cause whose text the message already ends with is not repeated.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !out.ends_with(&text) {
                out.push_str(": ");
                out.push_str(&text);
            }
            source = cause.source();
        }
        out
    }
}

/// Builds an [`ErrorContext`] from string pairs.
#[must_use]
pub fn error_context<const N: usize>(pairs: [(&str, &str); N]) -> ErrorContext {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_keeps_underlying_message() {
        let cause = AgentError::ApiRequest {
            message: "LLM connection error".to_string(),
            status: None,
        };
        let err = WorkflowError::classification(cause, ErrorContext::new());
        assert!(err.to_string().contains("LLM connection error"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_execution_display_names_stage() {
        let err = WorkflowError::execution(
            ExecutionStage::Retrieval,
            "retriever docs failed",
            std::io::Error::other("boom"),
            error_context([("retriever", "docs"), ("query", "hi")]),
        );
        let text = err.to_string();
        assert!(text.contains("retrieval"));
        assert!(text.contains("retriever docs failed"));
        let ctx = err.context().unwrap_or_else(|| unreachable!());
        assert_eq!(ctx.get("retriever").map(String::as_str), Some("docs"));
        assert_eq!(ctx.get("query").map(String::as_str), Some("hi"));
    }

    #[test]
    fn test_chain_includes_nested_causes() {
        let store = WorkflowError::store(
            "search failed",
            Some(Box::new(std::io::Error::other("connection refused"))),
            ErrorContext::new(),
        );
        let err = WorkflowError::execution(
            ExecutionStage::Retrieval,
            "retriever docs failed",
            store,
            ErrorContext::new(),
        );
        assert_eq!(
            err.chain(),
            "agent execution failed during retrieval: retriever docs failed: \
             vector store error: search failed: connection refused"
        );
    }

    #[test]
    fn test_chain_skips_repeated_cause() {
        let cause = AgentError::ApiRequest {
            message: "timeout".to_string(),
            status: None,
        };
        let err = WorkflowError::classification(cause, ErrorContext::new());
        assert_eq!(
            err.chain(),
            "intent classification failed: API request failed: timeout"
        );
    }

    #[test]
    fn test_model_errors_are_not_recoverable() {
        let err = WorkflowError::from(AgentError::ApiKeyMissing);
        assert!(!err.is_recoverable());
        assert!(err.context().is_none());

        let err = WorkflowError::tool("unknown tool: x", None, ErrorContext::new());
        assert!(err.is_recoverable());
    }
}
