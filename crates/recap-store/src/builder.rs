use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::memory::InMemoryStore;
use crate::trait_client::KeyValueStore;

/// Backend selected from a store URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Redis,
    Mongo,
}

impl BackendKind {
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| StoreError::UnsupportedBackend(format!("missing scheme in '{url}'")))?;

        match scheme.as_str() {
            "memory" => Ok(Self::Memory),
            "redis" | "rediss" | "valkey" => Ok(Self::Redis),
            "mongodb" | "mongodb+srv" => Ok(Self::Mongo),
            other => Err(StoreError::UnsupportedBackend(other.to_string())),
        }
    }
}

pub struct StoreBuilder {
    url: Option<String>,
    database: String,
    collection: String,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            url: None,
            database: "recap".to_string(),
            collection: "kv".to_string(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// MongoDB database name (ignored by other backends)
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// MongoDB collection name (ignored by other backends)
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub async fn build(self) -> Result<Arc<dyn KeyValueStore>> {
        let url = self
            .url
            .ok_or_else(|| StoreError::Internal("store url is required".to_string()))?;

        let store: Arc<dyn KeyValueStore> = match BackendKind::from_url(&url)? {
            BackendKind::Memory => Arc::new(InMemoryStore::new()),
            BackendKind::Redis => Self::redis(&url)?,
            BackendKind::Mongo => Self::mongo(&url, &self.database, &self.collection).await?,
        };

        tracing::info!(backend = store.backend_name(), "store client created");
        Ok(store)
    }

    #[cfg(feature = "redis")]
    fn redis(url: &str) -> Result<Arc<dyn KeyValueStore>> {
        // The redis crate only understands redis:// and rediss://
        let url = url.replacen("valkey://", "redis://", 1);
        Ok(Arc::new(crate::dbs::redis::RedisStore::new(&url)?))
    }

    #[cfg(not(feature = "redis"))]
    fn redis(_url: &str) -> Result<Arc<dyn KeyValueStore>> {
        Err(StoreError::UnsupportedBackend(
            "redis (built without the `redis` feature)".to_string(),
        ))
    }

    #[cfg(feature = "mongodb")]
    async fn mongo(url: &str, database: &str, collection: &str) -> Result<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(
            crate::dbs::mongo::MongoStore::connect(url, database, collection).await?,
        ))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn mongo(_url: &str, _database: &str, _collection: &str) -> Result<Arc<dyn KeyValueStore>> {
        Err(StoreError::UnsupportedBackend(
            "mongodb (built without the `mongodb` feature)".to_string(),
        ))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for `StoreBuilder::new().url(url).build()`
pub async fn connect(url: &str) -> Result<Arc<dyn KeyValueStore>> {
    StoreBuilder::new().url(url).build().await
}
