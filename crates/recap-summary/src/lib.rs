//! Threshold-triggered summarization of stored chat sessions.
//!
//! [`AutoSummaryController::check_and_trigger`] counts `memory:*` session
//! records, compares the growth since the last summary against a threshold,
//! and when it is reached asks the [`Summarizer`] for one structured summary
//! of the most recent sessions. The summary and the updated
//! [`SummaryMetadata`] are written back to the same store.

pub mod error;
pub mod models;
pub mod schema;
pub mod templates;
pub mod summarizer;
pub mod lock;
pub mod outcome;
pub mod controller;

pub use error::{Result, SummaryError};
pub use models::{
    SessionMessage, SessionRecord, StoredSession, SummaryMetadata, DEFAULT_COLLECTION,
    SESSION_KEY_PREFIX, SUMMARY_METADATA_KEY,
};
pub use schema::OutputSchema;
pub use summarizer::{parse_summary_response, strip_code_fence, Summarizer};
pub use lock::{LockConfig, SummaryLease, DEFAULT_LOCK_KEY, DEFAULT_LOCK_TTL};
pub use outcome::{NewSessionCount, SummaryOutcome};
pub use controller::{count_new_sessions, load_metadata, session_keys, AutoSummaryController};
