//! The routing graph: classify, handle, finalize.
//!
//! ```text
//! classify ─┬─> agent_a ──┐
//!           ├─> agent_b ──┼─> finalize ─> end
//!           └─> fallback ─┘
//! ```
//!
//! A domain handler that fails with a recoverable error is replaced by the
//! fallback handler, which then answers with the fixed error message.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, error, info, info_span, warn};

use super::context::AppContext;
use super::nodes::{DomainAgent, FallbackHandler, FinalResponder, IntentClassifier, Node};
use super::router::{Route, route};
use super::state::{GraphState, Intent, StateUpdate};
use crate::agent::message::ChatMessage;
use crate::error::WorkflowError;

/// Position in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Intent classification.
    Classify,
    /// Domain agent A.
    AgentA,
    /// Domain agent B.
    AgentB,
    /// Fallback handler.
    Fallback,
    /// Final response.
    Finalize,
    /// Terminal.
    End,
}

impl Step {
    /// Next step given the state after this step ran.
    #[must_use]
    pub const fn next(self, state: &GraphState) -> Self {
        match self {
            Self::Classify => Self::from_route(route(state.intent)),
            Self::AgentA | Self::AgentB | Self::Fallback => Self::Finalize,
            Self::Finalize | Self::End => Self::End,
        }
    }

    /// Step that runs the handler for `route`.
    #[must_use]
    pub const fn from_route(route: Route) -> Self {
        match route {
            Route::AgentA => Self::AgentA,
            Route::AgentB => Self::AgentB,
            Route::Fallback => Self::Fallback,
        }
    }

    /// Node name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::AgentA => Route::AgentA.node_name(),
            Self::AgentB => Route::AgentB.node_name(),
            Self::Fallback => Route::Fallback.node_name(),
            Self::Finalize => "finalize",
            Self::End => "end",
        }
    }

    const fn is_domain_handler(self) -> bool {
        matches!(self, Self::AgentA | Self::AgentB)
    }
}

/// Result of one workflow run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome {
    /// Final state.
    pub state: GraphState,
    /// Messages emitted during the run.
    pub responses: Vec<ChatMessage>,
}

impl WorkflowOutcome {
    /// Text of the last emitted message.
    #[must_use]
    pub fn reply(&self) -> &str {
        self.responses.last().map_or("", |m| m.content.as_str())
    }
}

/// The compiled routing graph.
pub struct Workflow {
    classifier: IntentClassifier,
    agent_a: DomainAgent,
    agent_b: DomainAgent,
    fallback: FallbackHandler,
    finalizer: FinalResponder,
}

impl Workflow {
    /// Builds every node from the application context.
    #[must_use]
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            classifier: IntentClassifier::new(
                Arc::clone(&ctx.provider),
                &ctx.settings,
                &ctx.prompts,
            ),
            agent_a: DomainAgent::agent_a(ctx),
            agent_b: DomainAgent::agent_b(ctx),
            fallback: FallbackHandler::new(ctx),
            finalizer: FinalResponder::new(ctx),
        }
    }

    /// Replaces the domain handler for the agent's route.
    ///
    /// Agents for [`Route::Fallback`] are ignored.
    #[must_use]
    pub fn with_agent(mut self, agent: DomainAgent) -> Self {
        match agent.route() {
            Route::AgentA => self.agent_a = agent,
            Route::AgentB => self.agent_b = agent,
            Route::Fallback => warn!("fallback handler cannot be replaced"),
        }
        self
    }

    fn node(&self, step: Step) -> Option<&dyn Node> {
        match step {
            Step::Classify => Some(&self.classifier),
            Step::AgentA => Some(&self.agent_a),
            Step::AgentB => Some(&self.agent_b),
            Step::Fallback => Some(&self.fallback),
            Step::Finalize => Some(&self.finalizer),
            Step::End => None,
        }
    }

    /// Runs the full graph for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Model`] when a model call fails outside the
    /// classifier. Recoverable handler failures are answered by the
    /// fallback handler instead.
    pub async fn invoke(&self, mut state: GraphState) -> Result<WorkflowOutcome, WorkflowError> {
        let emitted_from = state.messages.len();
        let mut step = Step::Classify;

        while let Some(node) = self.node(step) {
            match run_node(node, &state).await {
                Ok(update) => {
                    state.apply(update);
                    step = step.next(&state);
                }
                Err(e) if step.is_domain_handler() && e.is_recoverable() => {
                    warn!(node = step.name(), error = %e, "handler failed, diverting to fallback");
                    state.apply(
                        StateUpdate::default()
                            .with_intent(Intent::Unknown)
                            .with_error(Some(e.chain())),
                    );
                    step = Step::Fallback;
                }
                Err(e) => return Err(e),
            }
        }

        let responses = state.messages[emitted_from..].to_vec();
        Ok(WorkflowOutcome { state, responses })
    }

    /// Runs only the classifier and returns the updated state.
    ///
    /// # Errors
    ///
    /// The classifier records failures in the state, so this only fails if
    /// the node itself does.
    pub async fn classify(&self, mut state: GraphState) -> Result<GraphState, WorkflowError> {
        let update = run_node(&self.classifier, &state).await?;
        state.apply(update);
        Ok(state)
    }
}

/// Runs one node inside a span carrying the node name, intent and session.
async fn run_node(node: &dyn Node, state: &GraphState) -> Result<StateUpdate, WorkflowError> {
    let span = info_span!(
        "node",
        node = node.name(),
        intent = state.intent.map_or("", Intent::as_str),
        session_id = state.session_id().unwrap_or(""),
    );

    async {
        let started = Instant::now();
        info!("node_enter");
        let result = node.run(state).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(ref update) => info!(
                elapsed_ms,
                intent = update.intent.map_or("", Intent::as_str),
                "node_exit"
            ),
            Err(ref e) => error!(elapsed_ms, error = %e, "node_error"),
        }
        result
    }
    .instrument(span)
    .await
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("agent_a", &self.agent_a)
            .field("agent_b", &self.agent_b)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
