//! MCP tool parameter types.
//!
//! Input schemas for the MCP tools, generated with `schemars`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `route` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouteParams {
    /// The user message to route.
    pub message: String,

    /// Session id recorded in request metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Parameters for the `classify` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyParams {
    /// The user message to classify.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_optional() {
        let params: RouteParams =
            serde_json::from_str(r#"{"message": "hi"}"#).unwrap_or_else(|_| unreachable!());
        assert_eq!(params.message, "hi");
        assert!(params.session_id.is_none());
    }
}
