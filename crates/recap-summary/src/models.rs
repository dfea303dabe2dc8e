//! Records read from and written to the store.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of every session record key (`memory:<session_id>`)
pub const SESSION_KEY_PREFIX: &str = "memory:";
/// Single well-known key holding [`SummaryMetadata`]
pub const SUMMARY_METADATA_KEY: &str = "summary_metadata";
/// Collection used for summary keys when the caller does not pick one
pub const DEFAULT_COLLECTION: &str = "summary";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
}

impl SessionMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// One conversation written by the chat process. Never modified here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub messages: Vec<SessionMessage>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A decoded session plus the key it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSession {
    pub key: String,
    pub session_id: String,
    #[serde(flatten)]
    pub record: SessionRecord,
}

impl StoredSession {
    /// The key suffix wins over any `session_id` carried inside the record
    pub fn new(key: impl Into<String>, mut record: SessionRecord) -> Self {
        let key = key.into();
        let session_id = session_id_from_key(&key).to_string();
        record.session_id = None;
        Self {
            key,
            session_id,
            record,
        }
    }
}

/// `memory:abc` -> `abc`; keys without the prefix are returned unchanged
pub fn session_id_from_key(key: &str) -> &str {
    key.strip_prefix(SESSION_KEY_PREFIX).unwrap_or(key)
}

pub fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

pub fn summary_key(collection: &str, session_id: &str) -> String {
    format!("{collection}:{session_id}")
}

/// Bookkeeping for the most recent successful summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    #[serde(default)]
    pub last_summary_session_id: Option<String>,

    /// Session count at the moment the last summary record was written
    #[serde(default)]
    pub total_sessions_at_summary: usize,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SummaryMetadata {
    pub fn new(last_summary_session_id: Option<String>, total_sessions_at_summary: usize) -> Self {
        Self {
            last_summary_session_id,
            total_sessions_at_summary,
            timestamp: Some(Utc::now()),
        }
    }
}

/// Accepts RFC 3339, naive ISO-8601 (read as UTC) or unix seconds.
/// Anything else decodes as `None` instead of rejecting the record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                        .map(|naive| naive.and_utc())
                })
        }
        serde_json::Value::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1e9) as u32;
            DateTime::from_timestamp(whole, nanos)
        }
        _ => None,
    }
}
