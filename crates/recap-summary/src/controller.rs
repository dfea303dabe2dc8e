use std::num::NonZeroUsize;
use std::sync::Arc;

use recap_store::KeyValueStore;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SummaryError};
use crate::lock::{LockConfig, SummaryLease};
use crate::models::{
    summary_key, SessionRecord, StoredSession, SummaryMetadata, SESSION_KEY_PREFIX,
    SUMMARY_METADATA_KEY,
};
use crate::outcome::{NewSessionCount, SummaryOutcome};
use crate::summarizer::Summarizer;

/// Session keys and metadata read together at the start of a check
#[derive(Debug)]
struct Snapshot {
    session_keys: Vec<String>,
    metadata: SummaryMetadata,
}

impl Snapshot {
    fn counts(&self) -> NewSessionCount {
        NewSessionCount::new(self.session_keys.len(), self.metadata.total_sessions_at_summary)
    }
}

/// Decides when to summarize and keeps the summary bookkeeping consistent.
///
/// Session keys are re-read on every call. Summary records and metadata are
/// the only keys this controller writes.
pub struct AutoSummaryController {
    store: Arc<dyn KeyValueStore>,
    summarizer: Summarizer,
    threshold: NonZeroUsize,
    lock: Option<LockConfig>,
}

impl AutoSummaryController {
    pub fn new(store: Arc<dyn KeyValueStore>, summarizer: Summarizer, threshold: NonZeroUsize) -> Self {
        Self {
            store,
            summarizer,
            threshold,
            lock: Some(LockConfig::default()),
        }
    }

    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Run without the cross-process lease (single scheduler deployments)
    pub fn without_lock(mut self) -> Self {
        self.lock = None;
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold.get()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Metadata as stored, or the `{null, 0}` default when absent
    pub async fn load_metadata(&self) -> Result<SummaryMetadata> {
        load_metadata(self.store.as_ref()).await
    }

    pub async fn count_new_sessions(&self) -> Result<NewSessionCount> {
        Ok(self.snapshot().await?.counts())
    }

    /// Summarize when enough new sessions have accumulated.
    ///
    /// Never returns an error: every failure becomes a status-tagged outcome.
    /// The below-threshold path performs no writes.
    pub async fn check_and_trigger(&self, collection: &str) -> SummaryOutcome {
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to read session state");
                return SummaryOutcome::error(&e);
            }
        };

        let counts = snapshot.counts();
        let should_summarize = counts.new_sessions >= self.threshold();
        info!(
            new_sessions = counts.new_sessions,
            threshold = self.threshold(),
            should_summarize,
            "Checked auto-summary trigger"
        );
        if !should_summarize {
            return SummaryOutcome::no_summary_needed(counts, self.threshold());
        }

        let Some(lock) = &self.lock else {
            return self.summarize_and_persist(collection, snapshot).await;
        };

        let lease = match SummaryLease::acquire(self.store.as_ref(), lock).await {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                info!(key = %lock.key, "Summary lock held elsewhere, skipping");
                return SummaryOutcome::already_running();
            }
            Err(e) => {
                let e = SummaryError::from(e);
                error!(error = %e, "Failed to acquire summary lock");
                return SummaryOutcome::error(&e);
            }
        };

        // Another holder may have finished between the first read and the lease
        let outcome = match self.snapshot().await {
            Ok(fresh) => {
                let counts = fresh.counts();
                if counts.new_sessions >= self.threshold() {
                    self.summarize_and_persist(collection, fresh).await
                } else {
                    debug!(new_sessions = counts.new_sessions, "Threshold no longer met under lock");
                    SummaryOutcome::no_summary_needed(counts, self.threshold())
                }
            }
            Err(e) => SummaryOutcome::error(&e),
        };

        if let Err(e) = lease.release(self.store.as_ref()).await {
            warn!(error = %e, "Failed to release summary lock; it will expire");
        }

        outcome
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let metadata = load_metadata(self.store.as_ref()).await?;
        let session_keys = session_keys(self.store.as_ref()).await?;

        let snapshot = Snapshot { session_keys, metadata };
        let counts = snapshot.counts();
        if counts.current_sessions < counts.last_total {
            warn!(
                current_sessions = counts.current_sessions,
                last_total = counts.last_total,
                "Fewer sessions than at the last summary; records were deleted externally"
            );
        }
        info!(
            current_sessions = counts.current_sessions,
            last_total = counts.last_total,
            new_sessions = counts.new_sessions,
            "Counted memory sessions"
        );
        Ok(snapshot)
    }

    /// The `threshold` most recent decodable sessions, oldest first
    async fn load_recent_sessions(&self, keys: &[String]) -> Result<Vec<StoredSession>> {
        let values = self.store.get_many(keys).await?;

        let mut sessions = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            let Some(raw) = value else {
                debug!(key = %key, "Session disappeared before it could be read");
                continue;
            };
            match serde_json::from_str::<SessionRecord>(&raw) {
                Ok(record) => sessions.push(StoredSession::new(key.clone(), record)),
                Err(e) => warn!(key = %key, error = %e, "Skipping undecodable session record"),
            }
        }

        sessions.sort_by(|a, b| {
            a.record
                .timestamp
                .cmp(&b.record.timestamp)
                .then_with(|| a.key.cmp(&b.key))
        });
        let skip = sessions.len().saturating_sub(self.threshold());
        Ok(sessions.split_off(skip))
    }

    async fn summarize_and_persist(&self, collection: &str, snapshot: Snapshot) -> SummaryOutcome {
        info!("Auto-summary triggered");
        let current_total = snapshot.session_keys.len();

        let sessions = match self.load_recent_sessions(&snapshot.session_keys).await {
            Ok(sessions) if !sessions.is_empty() => sessions,
            Ok(_) => {
                error!("No memory sessions found");
                return SummaryOutcome::error(&SummaryError::NoSessionsFound);
            }
            Err(e) => return SummaryOutcome::error(&e),
        };
        let latest_id = sessions[sessions.len() - 1].session_id.clone();

        let summary = match self.summarizer.summarize(&sessions).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Summarization failed");
                return SummaryOutcome::error(&e);
            }
        };

        let key = summary_key(collection, &latest_id);
        let payload = match serde_json::to_string(&summary) {
            Ok(payload) => payload,
            Err(e) => return SummaryOutcome::error(&SummaryError::from(e)),
        };

        let persisted = match self.store.set(&key, &payload).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SummaryError::PersistFailure {
                key: key.clone(),
                reason: "write was not acknowledged".to_string(),
            }),
            Err(e) => Err(SummaryError::PersistFailure {
                key: key.clone(),
                reason: e.to_string(),
            }),
        };
        if let Err(e) = persisted {
            error!(error = %e, "Failed to save summary");
            return SummaryOutcome::SaveFailed {
                message: "Summary generated but failed to save".to_string(),
                summary_data: summary,
                error: e.to_string(),
            };
        }
        info!(key = %key, "Summary saved");

        let metadata = SummaryMetadata::new(Some(latest_id), current_total);
        let metadata_saved = self.save_metadata(&metadata).await;

        info!(sessions = sessions.len(), metadata_saved, "Auto-summary completed");
        SummaryOutcome::SummaryCompleted {
            message: "Auto-summary performed successfully".to_string(),
            summary_key: key,
            summary_data: summary,
            new_sessions_processed: sessions.len(),
            metadata_saved,
        }
    }

    async fn save_metadata(&self, metadata: &SummaryMetadata) -> bool {
        let payload = match serde_json::to_string(metadata) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to encode summary metadata");
                return false;
            }
        };
        match self.store.set(SUMMARY_METADATA_KEY, &payload).await {
            Ok(true) => {
                info!(
                    last_summary_session_id = ?metadata.last_summary_session_id,
                    total_sessions_at_summary = metadata.total_sessions_at_summary,
                    "Summary metadata saved"
                );
                true
            }
            Ok(false) => {
                error!("Summary metadata write was not acknowledged");
                false
            }
            Err(e) => {
                error!(error = %e, "Failed to save summary metadata");
                false
            }
        }
    }
}

/// Read [`SummaryMetadata`] from `store`; absent means `{null, 0}`
pub async fn load_metadata(store: &dyn KeyValueStore) -> Result<SummaryMetadata> {
    match store.get(SUMMARY_METADATA_KEY).await? {
        None => Ok(SummaryMetadata::default()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| SummaryError::CorruptMetadata(format!("{}: {}", SUMMARY_METADATA_KEY, e))),
    }
}

/// Every `memory:*` key currently in `store`
pub async fn session_keys(store: &dyn KeyValueStore) -> Result<Vec<String>> {
    let pattern = format!("{}*", SESSION_KEY_PREFIX);
    Ok(store
        .keys(&pattern)
        .await?
        .into_iter()
        .filter(|key| key.starts_with(SESSION_KEY_PREFIX))
        .collect())
}

/// Session growth since the last summary, without taking any action
pub async fn count_new_sessions(store: &dyn KeyValueStore) -> Result<NewSessionCount> {
    let metadata = load_metadata(store).await?;
    let current = session_keys(store).await?.len();
    Ok(NewSessionCount::new(current, metadata.total_sessions_at_summary))
}
