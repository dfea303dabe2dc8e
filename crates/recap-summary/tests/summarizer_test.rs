mod common;

use common::{ScriptedInvoker, VALID_SUMMARY};
use recap_summary::models::SessionMessage;
use recap_summary::{OutputSchema, SessionRecord, StoredSession, Summarizer, SummaryError};
use serde_json::json;

fn session(key: &str, text: &str) -> StoredSession {
    StoredSession::new(
        key,
        SessionRecord {
            messages: vec![SessionMessage::new("user", text)],
            timestamp: None,
            session_id: None,
        },
    )
}

#[tokio::test]
async fn test_summarize_embeds_conversation_and_schema() {
    let llm = ScriptedInvoker::replying(VALID_SUMMARY);
    let summarizer = Summarizer::new(llm.clone());

    let summary = summarizer
        .summarize(&[session("memory:a", "how do lifetimes work?")])
        .await
        .unwrap();
    assert!(summary["summary"]["summary_detail"].is_string());

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("how do lifetimes work?"));
    assert!(prompt.contains("\"session_id\": \"a\""));
    assert!(prompt.contains("summary_detail"));
}

#[tokio::test]
async fn test_custom_schema_and_template() {
    let llm = ScriptedInvoker::replying("{\"digest\": \"short\"}");
    let schema = OutputSchema::new(json!({"type": "object", "required": ["digest"]}));
    let summarizer = Summarizer::new(llm.clone())
        .with_schema(schema)
        .with_template("CONV=<conversation>\nSCHEMA=<output_schema>");

    let summary = summarizer.summarize(&[session("memory:b", "hello")]).await.unwrap();
    assert_eq!(summary, json!({"digest": "short"}));

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.starts_with("CONV=["));
    assert!(prompt.contains("SCHEMA={"));
}

#[tokio::test]
async fn test_empty_batch_is_rejected_without_calling_llm() {
    let llm = ScriptedInvoker::replying(VALID_SUMMARY);
    let summarizer = Summarizer::new(llm.clone());

    let err = summarizer.summarize(&[]).await.unwrap_err();
    assert!(matches!(err, SummaryError::NoSessionsFound));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_schema_mismatch_is_malformed() {
    let llm = ScriptedInvoker::replying("```json\n{\"something_else\": true}\n```");
    let summarizer = Summarizer::new(llm);

    let err = summarizer.summarize(&[session("memory:c", "hi")]).await.unwrap_err();
    assert!(matches!(err, SummaryError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_placeholder_text_in_session_reaches_llm_verbatim() {
    let llm = ScriptedInvoker::replying(VALID_SUMMARY);
    let summarizer = Summarizer::new(llm.clone());

    summarizer
        .summarize(&[session("memory:d", "what does <output_schema> mean?")])
        .await
        .unwrap();

    let prompt = llm.last_prompt().unwrap();
    let schema_text = summarizer.schema().to_prompt_string();
    assert!(prompt.contains("what does <output_schema> mean?"));
    assert_eq!(prompt.matches(schema_text.as_str()).count(), 1);
}
