//! # intent-router
//!
//! An LLM intent router. Each user message is classified into one of a
//! closed set of intents, handed to the matching domain agent (vector
//! retrieval, tool calls and one model call) or to a fallback handler, and
//! finally synthesized into a single assistant reply.
//!
//! ```text
//! START → classify ─┬─ INTENT_A → agent_a ─┐
//!                   ├─ INTENT_B → agent_b ─┼→ finalize → END
//!                   └─ UNKNOWN  → fallback ─┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use intent_router::{AppContext, GraphState, Settings, Workflow};
//!
//! # async fn run() -> intent_router::Result<()> {
//! let ctx = AppContext::from_settings(Settings::from_env()?)?;
//! let workflow = Workflow::new(&ctx);
//! let outcome = workflow.invoke(GraphState::new("Find the onboarding guide")).await?;
//! println!("{}", outcome.reply());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod rag;
pub mod workflow;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

pub use agent::{AgentExecutor, LlmProvider, PromptSet, Settings, ToolClient};
pub use error::{AgentError, Error, Result, WorkflowError};
pub use rag::{Document, Embedder, Retriever, VectorRetriever};
pub use workflow::{AppContext, GraphState, Intent, Route, Workflow, WorkflowOutcome};
