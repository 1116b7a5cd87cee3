//! Built-in local tools.
//!
//! Neither tool has a backend yet: `search` answers with an empty result set
//! and `summary` truncates its input. They exist so domain agents exercise the
//! full tool-call path.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::tool::{Tool, str_arg};
use crate::error::WorkflowError;

/// Maximum characters kept by [`SummaryTool`].
const SUMMARY_MAX_CHARS: usize = 100;

/// Keyword search against an external source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Run a keyword search against an external source."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query." }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn call(&self, args: Value) -> Result<Value, WorkflowError> {
        let query = str_arg(&args, "query");
        Ok(json!({
            "query": query,
            "results": [],
            "message": "no search backend configured"
        }))
    }
}

/// Short extractive summary of a text.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryTool;

#[async_trait]
impl Tool for SummaryTool {
    fn name(&self) -> &str {
        "summary"
    }

    fn description(&self) -> &str {
        "Summarize the given text."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text to summarize." },
                "query": { "type": "string", "description": "Used when `text` is absent." }
            },
            "additionalProperties": false
        })
    }

    async fn call(&self, args: Value) -> Result<Value, WorkflowError> {
        let text = match str_arg(&args, "text") {
            "" => str_arg(&args, "query"),
            text => text,
        };
        let summary: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        Ok(json!({
            "summary": summary,
            "truncated": text.chars().count() > SUMMARY_MAX_CHARS
        }))
    }
}
