use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SummaryError;

/// Session counts behind a trigger decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSessionCount {
    pub current_sessions: usize,
    pub last_total: usize,
    pub new_sessions: usize,
}

impl NewSessionCount {
    pub fn new(current_sessions: usize, last_total: usize) -> Self {
        Self {
            current_sessions,
            last_total,
            new_sessions: current_sessions.saturating_sub(last_total),
        }
    }
}

/// Result of one `check_and_trigger` call, tagged by `status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    NoSummaryNeeded {
        message: String,
        new_sessions_count: usize,
        threshold: usize,
    },
    SummaryCompleted {
        message: String,
        summary_key: String,
        summary_data: Value,
        new_sessions_processed: usize,
        metadata_saved: bool,
    },
    SaveFailed {
        message: String,
        summary_data: Value,
        error: String,
    },
    AlreadyRunning {
        message: String,
    },
    Error {
        message: String,
        error_kind: String,
        error: String,
    },
}

impl SummaryOutcome {
    pub fn no_summary_needed(count: NewSessionCount, threshold: usize) -> Self {
        SummaryOutcome::NoSummaryNeeded {
            message: format!(
                "Not enough new sessions. Need {} new sessions to trigger auto-summary.",
                threshold
            ),
            new_sessions_count: count.new_sessions,
            threshold,
        }
    }

    pub fn already_running() -> Self {
        SummaryOutcome::AlreadyRunning {
            message: "Another summarization is in progress".to_string(),
        }
    }

    pub fn error(err: &SummaryError) -> Self {
        SummaryOutcome::Error {
            message: format!("Auto-summary failed: {}", err),
            error_kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            SummaryOutcome::NoSummaryNeeded { .. } => "no_summary_needed",
            SummaryOutcome::SummaryCompleted { .. } => "summary_completed",
            SummaryOutcome::SaveFailed { .. } => "save_failed",
            SummaryOutcome::AlreadyRunning { .. } => "already_running",
            SummaryOutcome::Error { .. } => "error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SummaryOutcome::NoSummaryNeeded { message, .. }
            | SummaryOutcome::SummaryCompleted { message, .. }
            | SummaryOutcome::SaveFailed { message, .. }
            | SummaryOutcome::AlreadyRunning { message }
            | SummaryOutcome::Error { message, .. } => message,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SummaryOutcome::SummaryCompleted { .. })
    }
}
