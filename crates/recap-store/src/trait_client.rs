use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Key-value store operations shared by every backend
///
/// Only single-key operations are atomic. `set_if_absent` is the one
/// conditional write and exists so callers can build a lease on top of it.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend identifier for logs
    fn backend_name(&self) -> &'static str;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Read a value, `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Read several values in one round trip where the backend allows it.
    ///
    /// The result is positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// Write a value, returning `true` when the backend acknowledged it
    async fn set(&self, key: &str, value: &str) -> Result<bool>;

    /// List keys matching a Redis-style glob pattern
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Remove a key (no-op if absent)
    async fn delete(&self, key: &str) -> Result<()>;

    /// Write a value with expiry only if the key is absent (or expired)
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Remove a key only while it still holds `expected`
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        match self.get(key).await? {
            Some(current) if current == expected => {
                self.delete(key).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
