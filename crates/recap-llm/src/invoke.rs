// Single-prompt adapter over a chat client: prompt in, text out

use crate::traits::{ChatClient, ChatOptions, ChatRequest, TokenUsage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_TOP_P: f32 = 0.2;

/// Text returned by a single prompt invocation
#[derive(Debug, Clone)]
pub struct InvokeResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Anything that turns one prompt into one completion.
///
/// Transport and auth failures surface as errors; callers decide whether to
/// convert them into a structured result.
#[async_trait]
pub trait PromptInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<InvokeResponse>;
}

/// [`PromptInvoker`] backed by any [`ChatClient`] with fixed model and options
pub struct ChatInvoker {
    client: Arc<dyn ChatClient>,
    model: String,
    options: ChatOptions,
}

impl ChatInvoker {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            options: ChatOptions::new()
                .temperature(DEFAULT_TEMPERATURE)
                .top_p(DEFAULT_TOP_P),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }
}

#[async_trait]
impl PromptInvoker for ChatInvoker {
    async fn invoke(&self, prompt: &str) -> Result<InvokeResponse> {
        let request = ChatRequest::prompt(self.model.clone(), prompt)
            .with_options(self.options.clone());

        let response = self
            .client
            .chat(request)
            .await
            .with_context(|| format!("LLM invocation failed (model={})", self.model))?;

        let content = response
            .text()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("LLM returned no content"))?;

        tracing::info!(
            model = %self.model,
            content_len = content.len(),
            "LLM invoked successfully"
        );

        Ok(InvokeResponse {
            content,
            usage: response.usage,
        })
    }
}
