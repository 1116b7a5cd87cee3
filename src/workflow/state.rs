//! Request state threaded through the workflow.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agent::message::{ChatMessage, user_message};

/// Metadata key carrying the session identifier.
pub const SESSION_ID_KEY: &str = "session_id";

/// A classified user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Requests handled by domain agent A.
    IntentA,
    /// Requests handled by domain agent B.
    IntentB,
    /// Requests that match no domain.
    Unknown,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Self; 3] = [Self::IntentA, Self::IntentB, Self::Unknown];

    /// Wire label of the intent.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IntentA => "INTENT_A",
            Self::IntentB => "INTENT_B",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parses an exact wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == label)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one request as it moves through the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    /// Conversation messages; nodes only append.
    pub messages: Vec<ChatMessage>,
    /// Classified intent; `None` until the classifier has run.
    pub intent: Option<Intent>,
    /// Output of the domain handler.
    pub agent_output: String,
    /// Retrieved context; never shrinks.
    pub context: Vec<String>,
    /// Request metadata such as the session id.
    pub metadata: Map<String, Value>,
    /// Error recorded by the classifier or a failed handler.
    pub error: Option<String>,
}

impl GraphState {
    /// Creates the initial state for one user message.
    #[must_use]
    pub fn new(user_input: &str) -> Self {
        Self {
            messages: vec![user_message(user_input)],
            ..Self::default()
        }
    }

    /// Sets the session id in metadata.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.metadata
            .insert(SESSION_ID_KEY.to_string(), Value::String(session_id.into()));
        self
    }

    /// Session id from metadata, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.metadata.get(SESSION_ID_KEY).and_then(Value::as_str)
    }

    /// Text of the last message, or `""` when there are none.
    #[must_use]
    pub fn last_user_input(&self) -> &str {
        self.messages.last().map_or("", |m| m.content.as_str())
    }

    /// Merges a node's partial update.
    ///
    /// Messages are appended; every other field present in the update
    /// replaces the current value.
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(intent) = update.intent {
            self.intent = Some(intent);
        }
        if let Some(output) = update.agent_output {
            self.agent_output = output;
        }
        if let Some(context) = update.context {
            self.context = context;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        if let Some(error) = update.error {
            self.error = error;
        }
    }
}

/// Partial state returned by a node.
///
/// `error: Some(None)` clears a previously recorded error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// Messages to append.
    pub messages: Vec<ChatMessage>,
    /// New intent.
    pub intent: Option<Intent>,
    /// New handler output.
    pub agent_output: Option<String>,
    /// New context list.
    pub context: Option<Vec<String>>,
    /// New metadata.
    pub metadata: Option<Map<String, Value>>,
    /// New error value.
    pub error: Option<Option<String>>,
}

impl StateUpdate {
    /// Appends a message.
    #[must_use]
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the intent.
    #[must_use]
    pub const fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Sets the handler output.
    #[must_use]
    pub fn with_agent_output(mut self, output: impl Into<String>) -> Self {
        self.agent_output = Some(output.into());
        self
    }

    /// Sets the context list.
    #[must_use]
    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets or clears the error.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::assistant_message;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("INTENT_A", Some(Intent::IntentA) ; "intent a")]
    #[test_case("INTENT_B", Some(Intent::IntentB) ; "intent b")]
    #[test_case("UNKNOWN", Some(Intent::Unknown) ; "unknown")]
    #[test_case("intent_a", None ; "case sensitive")]
    #[test_case(" INTENT_A", None ; "no trimming")]
    #[test_case("", None ; "empty")]
    fn test_parse_intent(label: &str, expected: Option<Intent>) {
        assert_eq!(Intent::parse(label), expected);
    }

    #[test]
    fn test_intent_serializes_as_label() {
        let json = serde_json::to_string(&Intent::IntentB).unwrap_or_else(|_| unreachable!());
        assert_eq!(json, "\"INTENT_B\"");
    }

    #[test]
    fn test_new_state_has_one_user_message() {
        let state = GraphState::new("hello").with_session_id("s-1");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.last_user_input(), "hello");
        assert_eq!(state.session_id(), Some("s-1"));
        assert!(state.intent.is_none());
    }

    #[test]
    fn test_last_user_input_without_messages() {
        assert_eq!(GraphState::default().last_user_input(), "");
    }

    #[test]
    fn test_apply_clears_error_explicitly() {
        let mut state = GraphState {
            error: Some("boom".to_string()),
            ..GraphState::default()
        };
        state.apply(StateUpdate::default().with_intent(Intent::IntentA));
        assert_eq!(state.error.as_deref(), Some("boom"));

        state.apply(StateUpdate::default().with_error(None));
        assert!(state.error.is_none());
        assert_eq!(state.intent, Some(Intent::IntentA));
    }

    proptest! {
        #[test]
        fn prop_apply_appends_messages_and_keeps_absent_fields(
            existing in proptest::collection::vec(".{0,8}", 0..4),
            appended in proptest::collection::vec(".{0,8}", 0..4),
            output in proptest::option::of(".{0,8}"),
        ) {
            let mut state = GraphState::new("start").with_session_id("s");
            state.context.clone_from(&existing);
            let before = state.messages.len();

            let mut update = StateUpdate::default();
            for text in &appended {
                update = update.with_message(assistant_message(text));
            }
            if let Some(ref o) = output {
                update = update.with_agent_output(o.clone());
            }
            state.apply(update);

            prop_assert_eq!(state.messages.len(), before + appended.len());
            prop_assert_eq!(&state.context, &existing);
            prop_assert_eq!(state.session_id(), Some("s"));
            prop_assert_eq!(state.agent_output, output.unwrap_or_default());
        }
    }
}
