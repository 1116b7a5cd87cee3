//! Intent to handler routing.

use std::fmt;

use super::state::Intent;

/// Handler selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Domain agent A.
    AgentA,
    /// Domain agent B.
    AgentB,
    /// General questions and failed requests.
    Fallback,
}

impl Route {
    /// Routes a raw intent label. Unrecognised labels go to the fallback.
    #[must_use]
    pub fn for_label(label: &str) -> Self {
        route(Intent::parse(label))
    }

    /// Stable node name used in logs.
    #[must_use]
    pub const fn node_name(self) -> &'static str {
        match self {
            Self::AgentA => "agent_a",
            Self::AgentB => "agent_b",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_name())
    }
}

/// Picks the handler for a classified intent.
#[must_use]
pub const fn route(intent: Option<Intent>) -> Route {
    match intent {
        Some(Intent::IntentA) => Route::AgentA,
        Some(Intent::IntentB) => Route::AgentB,
        Some(Intent::Unknown) | None => Route::Fallback,
    }
}
