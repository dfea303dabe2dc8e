use recap_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("No session records found to summarize")]
    NoSessionsFound,

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("Failed to persist '{key}': {reason}")]
    PersistFailure { key: String, reason: String },

    #[error("Corrupt summary metadata: {0}")]
    CorruptMetadata(String),

    #[error("LLM invocation failed: {0}")]
    Llm(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SummaryError {
    /// Stable snake_case identifier for structured results and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SummaryError::StoreUnavailable(_) => "store_unavailable",
            SummaryError::NoSessionsFound => "no_sessions_found",
            SummaryError::MalformedResponse(_) => "malformed_response",
            SummaryError::PersistFailure { .. } => "persist_failure",
            SummaryError::CorruptMetadata(_) => "corrupt_metadata",
            SummaryError::Llm(_) => "llm",
            SummaryError::Schema(_) => "schema",
            SummaryError::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, SummaryError>;
