use std::time::Duration;

use recap_store::{KeyValueStore, StoreError};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_LOCK_KEY: &str = "summary_lock";
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq)]
pub struct LockConfig {
    pub key: String,
    /// Upper bound on how long a crashed holder can block others
    pub ttl: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_LOCK_KEY.to_string(),
            ttl: DEFAULT_LOCK_TTL,
        }
    }
}

impl LockConfig {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self { key: key.into(), ttl }
    }
}

/// Held lease on the summary lock key.
///
/// Must be released explicitly; an unreleased lease expires after its TTL.
#[derive(Debug)]
pub struct SummaryLease {
    key: String,
    token: String,
}

impl SummaryLease {
    /// `Ok(None)` when another holder owns the key
    pub async fn acquire(
        store: &dyn KeyValueStore,
        config: &LockConfig,
    ) -> Result<Option<Self>, StoreError> {
        let token = Uuid::new_v4().to_string();
        if store.set_if_absent(&config.key, &token, config.ttl).await? {
            debug!(key = %config.key, "Summary lock acquired");
            Ok(Some(Self {
                key: config.key.clone(),
                token,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns `false` if the lease had already expired and been taken over
    pub async fn release(self, store: &dyn KeyValueStore) -> Result<bool, StoreError> {
        let released = store.delete_if_equals(&self.key, &self.token).await?;
        if released {
            debug!(key = %self.key, "Summary lock released");
        } else {
            warn!(key = %self.key, "Summary lock was no longer held at release");
        }
        Ok(released)
    }
}
