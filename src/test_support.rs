//! Test doubles shared by unit and integration tests.
//!
//! Compiled for this crate's own tests and behind the `test-util` feature.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::agent::config::Settings;
use crate::agent::message::{ChatRequest, ChatResponse};
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Provider that replays scripted replies and records every request.
///
/// `Err` entries fail the call with an API error carrying that message.
/// Once the script is exhausted every call fails.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Creates a provider that replays `replies` in order.
    #[must_use]
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a provider whose every scripted call succeeds.
    #[must_use]
    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())))
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of chat calls made.
    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(ChatResponse::text(text)),
            Some(Err(message)) => Err(AgentError::ApiRequest {
                message,
                status: None,
            }),
            None => Err(AgentError::ApiRequest {
                message: "script exhausted".to_string(),
                status: None,
            }),
        }
    }
}

/// Settings with retrieval and the tool server disabled.
#[must_use]
pub fn test_settings() -> Settings {
    Settings::builder()
        .api_key("test-key")
        .vector_store_uri("")
        .build()
        .unwrap_or_else(|_| unreachable!())
}
