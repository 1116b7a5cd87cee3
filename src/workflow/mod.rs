//! Intent routing workflow.
//!
//! A request enters as a [`GraphState`] holding the user message, is
//! classified, handled by one domain agent or the fallback handler, and
//! leaves with exactly one assistant reply appended.

pub mod context;
pub mod graph;
pub mod nodes;
pub mod router;
pub mod state;

pub use context::AppContext;
pub use graph::{Step, Workflow, WorkflowOutcome};
pub use router::{Route, route};
pub use state::{GraphState, Intent, StateUpdate};
