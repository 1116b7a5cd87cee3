//! Output formatting for CLI commands.

use std::fmt::Write;

use serde_json::{Value, json};

use crate::error::{CommandError, Result};
use crate::workflow::{GraphState, Intent, WorkflowOutcome, route};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything other than `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Serializes `value` as pretty JSON followed by a newline.
pub fn to_json(value: &Value) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::OutputFormat(e.to_string()))?;
    out.push('\n');
    Ok(out)
}

fn intent_label(state: &GraphState) -> Value {
    state
        .intent
        .map_or(Value::Null, |i| Value::String(i.as_str().to_string()))
}

/// Formats the result of `ask`.
pub fn format_outcome(outcome: &WorkflowOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("{}\n", outcome.reply())),
        OutputFormat::Json => to_json(&json!({
            "session_id": outcome.state.session_id(),
            "intent": intent_label(&outcome.state),
            "reply": outcome.reply(),
            "agent_output": outcome.state.agent_output,
            "context": outcome.state.context,
            "error": outcome.state.error,
        })),
    }
}

/// Formats the result of `classify`.
pub fn format_classification(state: &GraphState, format: OutputFormat) -> Result<String> {
    let label = state.intent.map_or("", Intent::as_str);
    match format {
        OutputFormat::Text => {
            let mut out = format!("{label}\n");
            if let Some(ref error) = state.error {
                let _ = writeln!(out, "error: {error}");
            }
            Ok(out)
        }
        OutputFormat::Json => to_json(&json!({
            "intent": intent_label(state),
            "route": route(state.intent).node_name(),
            "error": state.error,
        })),
    }
}

/// Formats the intent table.
pub fn format_intents(format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for intent in Intent::ALL {
                let _ = writeln!(out, "{:<10} -> {}", intent.as_str(), route(Some(intent)));
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let rows: Vec<Value> = Intent::ALL
                .iter()
                .map(|i| json!({"intent": i.as_str(), "route": route(Some(*i)).node_name()}))
                .collect();
            to_json(&Value::Array(rows))
        }
    }
}
