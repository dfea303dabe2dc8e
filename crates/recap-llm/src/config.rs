// Provider configuration and client construction

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::gemini::GeminiClient;
use crate::openai::OpenAIClient;
use crate::traits::ChatClient;

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Defaults to https://api.openai.com/v1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Whole-request timeout; no timeout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout_secs: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

fn default_max_retries() -> u32 {
    2
}

/// Connection settings for the Gemini Generative Language API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Defaults to https://generativelanguage.googleapis.com/v1beta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Extra attempts after a 429, 5xx or transport failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout_secs: None,
            max_retries: default_max_retries(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Which backend serves completions, tagged by `provider`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI(OpenAIConfig),
    Gemini(GeminiConfig),
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        ProviderConfig::OpenAI(OpenAIConfig::new(api_key))
    }

    pub fn from_openai(config: OpenAIConfig) -> Self {
        ProviderConfig::OpenAI(config)
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        ProviderConfig::Gemini(GeminiConfig::new(api_key))
    }

    pub fn from_gemini(config: GeminiConfig) -> Self {
        ProviderConfig::Gemini(config)
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            ProviderConfig::OpenAI(_) => "openai",
            ProviderConfig::Gemini(_) => "gemini",
        }
    }
}

/// Builds a [`ChatClient`] for a [`ProviderConfig`]
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        let client: Arc<dyn ChatClient> = match &config {
            ProviderConfig::OpenAI(openai) => Arc::new(OpenAIClient::from_config(openai)?),
            ProviderConfig::Gemini(gemini) => Arc::new(GeminiClient::from_config(gemini)?),
        };
        tracing::debug!(provider = config.provider_name(), "chat client created");
        Ok(client)
    }
}
