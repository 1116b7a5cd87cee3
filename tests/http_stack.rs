//! Full-stack runs against mocked `OpenAI` and vector store endpoints.

use intent_router::{AppContext, GraphState, Intent, Settings, Workflow};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 0,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 }
    })
}

async fn mount_chat_script(server: &MockServer, replies: &[&str]) {
    for reply in replies {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

async fn mount_retrieval(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3] }],
            "usage": { "prompt_tokens": 3, "total_tokens": 3 }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/vectordb/entities/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": [{ "id": 1, "distance": 0.92, "content": "The onboarding guide lives in the wiki." }]
        })))
        .mount(server)
        .await;
}

fn settings(server: &MockServer) -> Settings {
    Settings::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .vector_store_uri(server.uri())
        .build()
        .unwrap_or_else(|_| unreachable!())
}

fn chat_bodies(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .filter(|r| r.url.path() == "/chat/completions")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

#[tokio::test]
async fn retrieved_documents_reach_agent_and_finalizer() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;
    mount_chat_script(&server, &["INTENT_A", "See the wiki.", "The guide is in the wiki."]).await;

    let ctx = AppContext::from_settings(settings(&server)).unwrap_or_else(|_| unreachable!());
    let outcome = Workflow::new(&ctx)
        .invoke(GraphState::new("Where is the onboarding guide?"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.state.intent, Some(Intent::IntentA));
    assert_eq!(
        outcome.state.context,
        vec!["The onboarding guide lives in the wiki.".to_string()]
    );
    assert_eq!(outcome.reply(), "The guide is in the wiki.");

    let requests = server.received_requests().await.unwrap_or_default();
    let chats = chat_bodies(&requests);
    assert_eq!(chats.len(), 3);
    assert!(chats[1].contains("onboarding guide lives in the wiki"));
    assert!(chats[2].contains("See the wiki."));
}

#[tokio::test]
async fn vector_store_outage_is_answered_with_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.1] }],
            "usage": { "prompt_tokens": 1, "total_tokens": 1 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/vectordb/entities/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_chat_script(&server, &["INTENT_B", "We hit a problem, please retry."]).await;

    let ctx = AppContext::from_settings(settings(&server)).unwrap_or_else(|_| unreachable!());
    let outcome = Workflow::new(&ctx)
        .invoke(GraphState::new("Summarize the release notes"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.state.intent, Some(Intent::Unknown));
    assert!(
        outcome
            .state
            .error
            .as_deref()
            .is_some_and(|e| e.contains("retrieval"))
    );
    assert_eq!(outcome.reply(), "We hit a problem, please retry.");
}

#[tokio::test]
async fn rejected_api_key_surfaces_as_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("UNKNOWN")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let settings = Settings::builder()
        .api_key("bad-key")
        .base_url(server.uri())
        .vector_store_uri("")
        .build()
        .unwrap_or_else(|_| unreachable!());
    let ctx = AppContext::from_settings(settings).unwrap_or_else(|_| unreachable!());

    let result = Workflow::new(&ctx).invoke(GraphState::new("hello")).await;
    assert!(result.is_err());
}
