use std::path::Path;
use std::sync::Arc;

use recap_llm::PromptInvoker;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SummaryError};
use crate::models::StoredSession;
use crate::schema::OutputSchema;
use crate::templates::{self, DEFAULT_SUMMARY_PROMPT};

/// Turns a batch of sessions into one schema-shaped summary object
pub struct Summarizer {
    llm: Arc<dyn PromptInvoker>,
    schema: OutputSchema,
    template: String,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn PromptInvoker>) -> Self {
        Self {
            llm,
            schema: OutputSchema::default(),
            template: DEFAULT_SUMMARY_PROMPT.to_string(),
        }
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_template_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| {
            SummaryError::Schema(format!("failed to read prompt template {}: {}", path.display(), e))
        })?;
        Ok(self.with_template(template))
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    pub fn build_prompt(&self, sessions: &[StoredSession]) -> Result<String> {
        let conversation = serde_json::to_string_pretty(sessions)?;
        Ok(templates::render(
            &self.template,
            &conversation,
            &self.schema.to_prompt_string(),
        ))
    }

    pub async fn summarize(&self, sessions: &[StoredSession]) -> Result<Value> {
        if sessions.is_empty() {
            return Err(SummaryError::NoSessionsFound);
        }

        let prompt = self.build_prompt(sessions)?;
        debug!(sessions = sessions.len(), prompt_chars = prompt.len(), "Invoking LLM for summary");

        let response = self
            .llm
            .invoke(&prompt)
            .await
            .map_err(|e| SummaryError::Llm(format!("{:#}", e)))?;

        if let Some(usage) = &response.usage {
            info!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Summary completion received"
            );
        }

        parse_summary_response(&response.content, &self.schema)
    }
}

/// Remove a surrounding ```json / ``` fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Decode an LLM completion into a summary object that satisfies `schema`
pub fn parse_summary_response(text: &str, schema: &OutputSchema) -> Result<Value> {
    let body = strip_code_fence(text);

    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "LLM response is not valid JSON");
        SummaryError::MalformedResponse(format!("response is not valid JSON: {}", e))
    })?;

    schema.validate(&value)?;
    Ok(value)
}
