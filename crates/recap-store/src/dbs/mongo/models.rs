use serde::{Deserialize, Serialize};

/// One key-value pair stored as a MongoDB document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvDocument {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<bson::DateTime>,
}

impl KvDocument {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expires_at: None,
        }
    }

    pub fn is_live(&self, now: bson::DateTime) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}
