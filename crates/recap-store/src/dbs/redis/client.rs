use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Cmd, FromRedisValue, RedisError};
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::trait_client::KeyValueStore;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Keys per MGET round trip
const MGET_CHUNK: usize = 512;

/// Redis-backed store
///
/// Holds one multiplexed connection, opened lazily and shared by clones. A
/// dropped connection is reopened once before the command fails.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl RedisStore {
    /// Create a store for `redis://` / `rediss://` URLs. Does not connect yet.
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut cached = self.connection.lock().await;
        if let Some(connection) = cached.as_ref() {
            return Ok(connection.clone());
        }

        let connection =
            tokio::time::timeout(CONNECT_TIMEOUT, self.client.get_multiplexed_async_connection())
                .await
                .map_err(|_| StoreError::Unavailable("timed out connecting to redis".to_string()))?
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::debug!("redis connection opened");

        *cached = Some(connection.clone());
        Ok(connection)
    }

    async fn run<T>(&self, op: &'static str, cmd: Cmd) -> Result<T>
    where
        T: FromRedisValue + Send,
    {
        let mut connection = self.connection().await?;
        let first: redis::RedisResult<T> = cmd.query_async(&mut connection).await;
        let result = match first {
            Err(e) if is_connection_lost(&e) => {
                tracing::warn!(op, error = %e, "redis connection lost; reconnecting");
                self.connection.lock().await.take();
                let mut connection = self.connection().await?;
                cmd.query_async(&mut connection).await
            }
            other => other,
        };

        result.map_err(|e| {
            tracing::warn!(op, error = %e, "redis command failed");
            StoreError::from(e)
        })
    }
}

fn is_connection_lost(error: &RedisError) -> bool {
    error.is_connection_dropped() || error.is_io_error()
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<()> {
        self.run::<String>("ping", redis::cmd("PING"))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run("get", cmd).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(MGET_CHUNK) {
            let mut cmd = redis::cmd("MGET");
            cmd.arg(chunk);
            values.extend(self.run::<Vec<Option<String>>>("get_many", cmd).await?);
        }
        Ok(values)
    }

    async fn set(&self, key: &str, value: &str) -> Result<bool> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        self.run::<()>("set", cmd).await?;
        Ok(true)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut cmd = redis::cmd("KEYS");
        cmd.arg(pattern);
        self.run("keys", cmd).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.run::<()>("delete", cmd).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX").arg("PX").arg(ttl_ms);
        let reply = self.run::<Option<String>>("set_if_absent", cmd).await?;
        Ok(reply.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_reports_unavailable() {
        let store = RedisStore::new("redis://127.0.0.1:1").unwrap();
        let err = store.ping().await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.connection.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_get_many_without_keys_skips_the_server() {
        let store = RedisStore::new("redis://127.0.0.1:1").unwrap();
        assert!(store.get_many(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisStore::new("not a url").is_err());
    }
}
