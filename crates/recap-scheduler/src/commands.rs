use anyhow::{bail, Result};
use recap_store::KeyValueStore;
use recap_summary::{NewSessionCount, SummaryError, SummaryMetadata};
use serde::Serialize;
use tracing::info;

/// Read-only view of the trigger state
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub backend: &'static str,
    pub threshold: usize,
    #[serde(flatten)]
    pub counts: NewSessionCount,
    pub metadata: SummaryMetadata,
    pub would_trigger: bool,
}

pub async fn status(
    store: &dyn KeyValueStore,
    threshold: usize,
) -> Result<StatusReport, SummaryError> {
    let metadata = recap_summary::load_metadata(store).await?;
    let counts = recap_summary::count_new_sessions(store).await?;
    Ok(StatusReport {
        backend: store.backend_name(),
        threshold,
        would_trigger: counts.new_sessions >= threshold,
        counts,
        metadata,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub pattern: String,
    pub keys: Vec<String>,
    pub deleted: bool,
}

/// Delete every key matching `pattern`, or only list them when `dry_run`
pub async fn purge(store: &dyn KeyValueStore, pattern: &str, dry_run: bool) -> Result<PurgeReport> {
    if pattern.trim().is_empty() {
        bail!("Refusing to purge with an empty pattern");
    }

    let keys = store.keys(pattern).await?;
    if !dry_run {
        for key in &keys {
            store.delete(key).await?;
        }
        info!(pattern, deleted = keys.len(), "Purged keys");
    }

    Ok(PurgeReport {
        pattern: pattern.to_string(),
        keys,
        deleted: !dry_run,
    })
}
