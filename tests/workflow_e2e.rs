//! End-to-end runs of the routing graph through the public API.

use std::sync::Arc;

use intent_router::agent::{LlmProvider, Role};
use intent_router::agent::prompt::{ERROR_MESSAGE, FALLBACK_MESSAGE};
use intent_router::test_support::{ScriptedProvider, test_settings};
use intent_router::{AppContext, GraphState, Intent, Workflow};

fn workflow(provider: &Arc<ScriptedProvider>) -> Workflow {
    let provider: Arc<dyn LlmProvider> = provider.clone();
    let ctx = AppContext::new(test_settings(), provider);
    Workflow::new(&ctx)
}

#[tokio::test]
async fn intent_a_runs_agent_then_finalize() {
    let provider = Arc::new(ScriptedProvider::replying(&[
        "INTENT_A",
        "draft answer",
        "final answer",
    ]));

    let outcome = workflow(&provider)
        .invoke(GraphState::new("Find the onboarding guide"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.state.intent, Some(Intent::IntentA));
    assert_eq!(outcome.state.agent_output, "draft answer");
    assert_eq!(outcome.responses.len(), 1);
    assert_eq!(outcome.reply(), "final answer");
    assert!(outcome.state.error.is_none());

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    let final_system = &requests[2].messages[0];
    assert_eq!(final_system.role, Role::System);
    assert!(final_system.content.contains("draft answer"));
}

#[tokio::test]
async fn unknown_intent_is_answered_by_fallback() {
    let provider = Arc::new(ScriptedProvider::replying(&[
        "something else",
        "I can only help with documents.",
        "final",
    ]));

    let outcome = workflow(&provider)
        .invoke(GraphState::new("What's the weather?"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.state.intent, Some(Intent::Unknown));
    assert_eq!(outcome.state.agent_output, "I can only help with documents.");
    assert_eq!(outcome.responses.len(), 1);
}

#[tokio::test]
async fn classifier_failure_yields_error_message() {
    let provider = Arc::new(ScriptedProvider::new([
        Err("connection reset".to_string()),
        Ok("Please try again later.".to_string()),
    ]));

    let outcome = workflow(&provider)
        .invoke(GraphState::new("hello"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.state.intent, Some(Intent::Unknown));
    assert!(outcome.state.error.is_some());
    assert_eq!(outcome.state.agent_output, ERROR_MESSAGE);
    assert_eq!(outcome.reply(), "Please try again later.");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn empty_handler_output_finalizes_with_canned_reply() {
    let provider = Arc::new(ScriptedProvider::replying(&["INTENT_B", ""]));

    let outcome = workflow(&provider)
        .invoke(GraphState::new("Summarize the notes"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.state.intent, Some(Intent::IntentB));
    assert_eq!(outcome.reply(), FALLBACK_MESSAGE);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn classify_only_makes_one_call() {
    let provider = Arc::new(ScriptedProvider::replying(&[" INTENT_B \n"]));

    let state = workflow(&provider)
        .classify(GraphState::new("Summarize this"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(state.intent, Some(Intent::IntentB));
    assert_eq!(provider.calls(), 1);
}
