use crate::config::Settings;
use crate::error::{CopilotError, Result};
use crate::query::Query;
use crate::retry::RetryPolicy;
use crate::services::{Generator, Prompt};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// OpenAI-compatible chat completions client that only accepts JSON answers.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry_policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.llm_timeout_ms))
            .build()
            .map_err(|e| CopilotError::Config(format!("Failed to build LLM client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.llm_base_url.trim_end_matches('/').to_string(),
            api_key: settings.llm_api_key.clone(),
            model: settings.llm_model.clone(),
            retry_policy: settings.llm_retry_policy(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// One chat completion round trip. Returns the raw message content.
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": prompt.temperature,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CopilotError::LlmTransport(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CopilotError::LlmTransport(format!(
                "LLM API returned {}: {}",
                status, text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| CopilotError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        response_json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CopilotError::Llm("No content in LLM response".to_string()))
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(&self, prompt: &Prompt) -> Result<Query> {
        debug!("Calling {} at temperature {}", self.model, prompt.temperature);
        let content = self
            .retry_policy
            .retry(|| self.complete(prompt), |e: &CopilotError| e.is_transient())
            .await?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| CopilotError::Llm(format!("LLM returned invalid JSON: {}", e)))?;
        info!("LLM returned {} bytes of JSON", content.len());
        Ok(Query::from(value))
    }
}
