use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection};

use crate::dbs::mongo::models::KvDocument;
use crate::error::{Result, StoreError};
use crate::pattern::KeyPattern;
use crate::trait_client::KeyValueStore;

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed store: one document per key in a single collection
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
    collection: Collection<KvDocument>,
}

impl MongoStore {
    /// Connect to MongoDB and bind the key-value collection
    pub async fn connect(mongodb_uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let collection = client.database(database).collection(collection);

        Ok(Self {
            client,
            database: database.to_string(),
            collection,
        })
    }

    fn live_filter(now: mongodb::bson::DateTime) -> Document {
        doc! {
            "$or": [
                { "expires_at": Bson::Null },
                { "expires_at": { "$gt": now } },
            ]
        }
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn escape_regex(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl KeyValueStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = mongodb::bson::DateTime::now();
        let found = self.collection.find_one(doc! { "_id": key }).await?;
        Ok(found.filter(|d| d.is_live(now)).map(|d| d.value))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let now = mongodb::bson::DateTime::now();
        let mut found: HashMap<String, String> = self
            .collection
            .find(doc! { "_id": { "$in": keys.to_vec() } })
            .await?
            .try_collect::<Vec<KvDocument>>()
            .await?
            .into_iter()
            .filter(|d| d.is_live(now))
            .map(|d| (d.key, d.value))
            .collect();
        Ok(keys.iter().map(|key| found.remove(key)).collect())
    }

    async fn set(&self, key: &str, value: &str) -> Result<bool> {
        let document = KvDocument::new(key, value);
        let result = self
            .collection
            .replace_one(doc! { "_id": key }, &document)
            .upsert(true)
            .await?;
        Ok(result.matched_count > 0 || result.upserted_id.is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        let mut filter = Self::live_filter(mongodb::bson::DateTime::now());
        let prefix = pattern.literal_prefix();
        if !prefix.is_empty() {
            filter.insert("_id", doc! { "$regex": format!("^{}", escape_regex(prefix)) });
        }

        let keys: Vec<String> = self
            .collection
            .clone_with_type::<Document>()
            .find(filter)
            .projection(doc! { "_id": 1 })
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect::<Vec<Document>>()
            .await?
            .into_iter()
            .filter_map(|d| d.get_str("_id").ok().map(str::to_string))
            .filter(|key| pattern.matches(key))
            .collect();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = mongodb::bson::DateTime::now();
        self.collection
            .delete_one(doc! { "_id": key, "expires_at": { "$lte": now } })
            .await?;

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let document = KvDocument {
            key: key.to_string(),
            value: value.to_string(),
            expires_at: Some(mongodb::bson::DateTime::from_millis(
                now.timestamp_millis().saturating_add(ttl_ms),
            )),
        };

        match self.collection.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": key, "value": expected })
            .await?;
        Ok(result.deleted_count == 1)
    }
}
