use std::sync::Arc;

use recap_llm::{ChatClient, ChatInvoker, ChatRequest, Message, OpenAIClient, OpenAIConfig, PromptInvoker};

fn completion_body(content: Option<&str>) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
    })
    .to_string()
}

fn client_for(server: &mockito::Server) -> OpenAIClient {
    let config = OpenAIConfig::new("test-key").with_base_url(server.url());
    OpenAIClient::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_chat_parses_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(Some("hello back")))
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .chat(ChatRequest::new("gpt-4o-mini", vec![Message::user("hello")]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("hello back"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 17);
}

#[tokio::test]
async fn test_chat_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"bad key"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .chat(ChatRequest::new("gpt-4o-mini", vec![Message::user("hello")]))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("401"), "unexpected error: {text}");
    assert!(text.contains("bad key"), "unexpected error: {text}");
}

#[tokio::test]
async fn test_invoker_returns_text() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "summarize this" }]
        })))
        .with_status(200)
        .with_body(completion_body(Some("{\"summary\":{}}")))
        .create_async()
        .await;

    let invoker = ChatInvoker::new(Arc::new(client_for(&server)));
    let response = invoker.invoke("summarize this").await.unwrap();

    assert_eq!(response.content, "{\"summary\":{}}");
    assert_eq!(response.usage.unwrap().input_tokens, 12);
}

#[tokio::test]
async fn test_invoker_rejects_empty_completion() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(None))
        .create_async()
        .await;

    let invoker = ChatInvoker::new(Arc::new(client_for(&server)));
    let err = invoker.invoke("summarize this").await.unwrap_err();

    assert!(err.to_string().contains("no content"));
}
