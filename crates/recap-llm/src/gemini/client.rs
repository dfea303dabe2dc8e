// Gemini (Generative Language API) client implementation

use crate::config::GeminiConfig;
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::{Message, Role};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const GEMINI_DEFAULT_TEMPERATURE: f32 = 0.1;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Gemini client (HTTP direct, no SDK)
///
/// Differences from the OpenAI wire format:
/// - URL: {base}/models/{model}:generateContent
/// - Auth header: x-goog-api-key
/// - System turns travel in `systemInstruction`, assistant turns use role `model`
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&GeminiConfig::new(api_key))
    }

    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&config.api_key).context("Invalid API key format")?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http_client,
            base_url,
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn build_generate_request(messages: Vec<Message>, options: &ChatOptions) -> Value {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let parts: Vec<Value> = message
                .content
                .segments()
                .into_iter()
                .map(|text| json!({ "text": text }))
                .collect();
            match message.role {
                Role::System => system_parts.extend(parts),
                Role::User => contents.push(json!({ "role": "user", "parts": parts })),
                Role::Assistant => contents.push(json!({ "role": "model", "parts": parts })),
            }
        }

        let mut request = Map::new();
        request.insert("contents".to_string(), Value::Array(contents));
        if !system_parts.is_empty() {
            request.insert(
                "systemInstruction".to_string(),
                json!({ "parts": system_parts }),
            );
        }

        let mut generation = Map::new();
        if let Some(temp) = options.temperature {
            generation.insert("temperature".to_string(), json!(temp));
        }
        if let Some(top_p) = options.top_p {
            generation.insert("topP".to_string(), json!(top_p));
        }
        if let Some(max_tokens) = options.max_tokens {
            generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if !generation.is_empty() {
            request.insert("generationConfig".to_string(), Value::Object(generation));
        }

        Value::Object(request)
    }

    /// POST with retries on 429, 5xx and transport failures
    async fn send(&self, url: &str, payload: &Value) -> Result<GenerateContentResponse> {
        let mut attempt = 0;
        loop {
            let outcome = self.http_client.post(url).json(payload).send().await;

            let retryable = match &outcome {
                Ok(response) => is_retryable(response.status()),
                Err(err) => !err.is_builder(),
            };
            if retryable && attempt < self.max_retries {
                attempt += 1;
                tracing::warn!(attempt, max_retries = self.max_retries, "retrying Gemini request");
                tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
                continue;
            }

            let response = outcome.context("Failed to send request")?;
            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Gemini API error ({}): {}", status, error_text);
            }

            return response.json().await.context("Failed to parse response");
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = Self::build_generate_request(request.messages, &request.options);
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let raw = self.send(&url, &payload).await?;

        tracing::debug!(model = %request.model, candidates = raw.candidates.len(), "generate content received");

        let candidate = raw.candidates.first();
        let content = candidate
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        Ok(ChatResponse {
            content,
            usage: raw.usage_metadata.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason: candidate.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(&raw)?,
        })
    }
}

// ============================================================================
// GEMINI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;

    #[test]
    fn test_payload_maps_roles_and_generation_config() {
        let options = ChatOptions::new().temperature(0.1).top_p(0.2).max_tokens(256);
        let payload = GeminiClient::build_generate_request(
            vec![
                Message::system("be brief"),
                Message::user(Content::from_parts(["first", "second"])),
                Message::assistant("ok"),
            ],
            &options,
        );

        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(payload["contents"].as_array().unwrap().len(), 2);
        assert_eq!(payload["contents"][0]["role"], "user");
        assert_eq!(payload["contents"][0]["parts"][1]["text"], "second");
        assert_eq!(payload["contents"][1]["role"], "model");
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 256);
        assert!(payload["generationConfig"]["topP"].as_f64().is_some());
    }

    #[test]
    fn test_payload_without_options_omits_generation_config() {
        let payload =
            GeminiClient::build_generate_request(vec![Message::user("hi")], &ChatOptions::new());
        assert!(payload.get("generationConfig").is_none());
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }
}
