#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use recap_llm::{InvokeResponse, PromptInvoker};
use recap_store::{InMemoryStore, KeyValueStore, StoreError};
use recap_summary::{AutoSummaryController, Summarizer};
use serde_json::json;

pub const VALID_SUMMARY: &str =
    "```json\n{\"summary\": {\"summary_detail\": \"The user asked about Rust.\"}}\n```";

/// Returns a fixed completion and records every prompt
pub struct ScriptedInvoker {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PromptInvoker for ScriptedInvoker {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<InvokeResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(content) => Ok(InvokeResponse {
                content: content.clone(),
                usage: None,
            }),
            Err(message) => anyhow::bail!("{}", message),
        }
    }
}

/// In-memory store that can refuse writes to keys with a given prefix
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_writes_to: Arc<Mutex<Option<String>>>,
    before_lock_grant: Arc<Mutex<Option<(String, String)>>>,
    pub writes: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
    pub bulk_reads: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_to(&self, prefix: &str) {
        *self.fail_writes_to.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn heal(&self) {
        *self.fail_writes_to.lock().unwrap() = None;
    }

    /// Write `key = value` right before the next lease is granted, as if
    /// another scheduler finished a summary in the meantime
    pub fn before_lock_grant(&self, key: &str, value: &str) {
        *self.before_lock_grant.lock().unwrap() = Some((key.to_string(), value.to_string()));
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn bulk_read_count(&self) -> usize {
        self.bulk_reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn should_fail(&self, key: &str) -> bool {
        self.fail_writes_to
            .lock()
            .unwrap()
            .as_deref()
            .map_or(false, |prefix| key.starts_with(prefix))
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn ping(&self) -> recap_store::Result<()> {
        self.inner.ping().await
    }

    async fn get(&self, key: &str) -> recap_store::Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn get_many(&self, keys: &[String]) -> recap_store::Result<Vec<Option<String>>> {
        self.bulk_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_many(keys).await
    }

    async fn set(&self, key: &str, value: &str) -> recap_store::Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(key) {
            return Err(StoreError::Unavailable(format!("simulated write failure for {key}")));
        }
        self.inner.set(key, value).await
    }

    async fn keys(&self, pattern: &str) -> recap_store::Result<Vec<String>> {
        self.inner.keys(pattern).await
    }

    async fn delete(&self, key: &str) -> recap_store::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> recap_store::Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let pending = self.before_lock_grant.lock().unwrap().take();
        if let Some((other_key, other_value)) = pending {
            self.inner.set(&other_key, &other_value).await?;
        }
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> recap_store::Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_if_equals(key, expected).await
    }
}

/// Write `count` sessions `memory:s<offset>`..., one minute apart
pub async fn seed_sessions(store: &dyn KeyValueStore, offset: usize, count: usize) {
    for i in offset..offset + count {
        let record = json!({
            "messages": [
                {"role": "user", "content": format!("question {i}")},
                {"role": "assistant", "content": format!("answer {i}")}
            ],
            "timestamp": format!("2024-01-01T00:{:02}:00Z", i),
            "session_id": format!("s{i:02}")
        });
        store
            .set(&format!("memory:s{i:02}"), &record.to_string())
            .await
            .unwrap();
    }
}

pub fn controller(
    store: Arc<dyn KeyValueStore>,
    llm: Arc<ScriptedInvoker>,
    threshold: usize,
) -> AutoSummaryController {
    AutoSummaryController::new(
        store,
        Summarizer::new(llm),
        NonZeroUsize::new(threshold).unwrap(),
    )
}
