//! Settings
//!
//! Service configuration read from the process environment (and `.env`).

use crate::error::{CopilotError, Result};
use crate::retry::RetryPolicy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Settings {
    pub app_env: String,
    pub app_port: u16,

    pub es_url: String,
    pub es_user: String,
    pub es_password: String,
    pub es_default_index: String,
    pub es_accept_invalid_certs: bool,

    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_timeout_ms: u64,
    pub llm_retry_attempts: u32,
    pub llm_retry_base_delay_ms: u64,
    pub llm_retry_max_delay_ms: u64,

    pub max_validate_retry: u32,
    pub max_size: u64,
    pub max_from_size: u64,
    pub default_timeout_ms: u64,
    /// Per-call bound on validator / generator calls inside the repair loop
    pub pipeline_call_timeout_ms: Option<u64>,

    pub field_catalog_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_env: "dev".to_string(),
            app_port: 8080,
            es_url: "http://localhost:9200".to_string(),
            es_user: "elastic".to_string(),
            es_password: "changeme".to_string(),
            es_default_index: "orders-*".to_string(),
            es_accept_invalid_certs: true,
            llm_provider: "openai".to_string(),
            llm_model: "gpt-4o".to_string(),
            llm_api_key: String::new(),
            llm_base_url: OPENAI_BASE_URL.to_string(),
            llm_timeout_ms: 30_000,
            llm_retry_attempts: 3,
            llm_retry_base_delay_ms: 2_000,
            llm_retry_max_delay_ms: 10_000,
            max_validate_retry: 2,
            max_size: 200,
            max_from_size: 10_000,
            default_timeout_ms: 2_000,
            pipeline_call_timeout_ms: None,
            field_catalog_path: PathBuf::from("data/field_catalog.json"),
        }
    }
}

impl Settings {
    /// Load from `.env` and the environment. `LLM_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str, default: String| lookup(key).unwrap_or(default);

        let llm_api_key = lookup("LLM_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CopilotError::Config("LLM_API_KEY is not set".to_string()))?;

        let llm_provider = get("LLM_PROVIDER", defaults.llm_provider);
        let llm_base_url = match lookup("LLM_BASE_URL") {
            Some(url) => url,
            None if llm_provider == "openai" => OPENAI_BASE_URL.to_string(),
            None => {
                return Err(CopilotError::Config(format!(
                    "LLM_BASE_URL is required for provider '{}'",
                    llm_provider
                )))
            }
        };

        Ok(Self {
            app_env: get("APP_ENV", defaults.app_env),
            app_port: parse_or(&lookup, "APP_PORT", defaults.app_port),
            es_url: get("ES_URL", defaults.es_url),
            es_user: get("ES_USER", defaults.es_user),
            es_password: get("ES_PASSWORD", defaults.es_password),
            es_default_index: get("ES_DEFAULT_INDEX", defaults.es_default_index),
            es_accept_invalid_certs: parse_or(&lookup, "ES_ACCEPT_INVALID_CERTS", defaults.es_accept_invalid_certs),
            llm_provider,
            llm_model: get("LLM_MODEL", defaults.llm_model),
            llm_api_key,
            llm_base_url: llm_base_url.trim_end_matches('/').to_string(),
            llm_timeout_ms: parse_or(&lookup, "LLM_TIMEOUT_MS", defaults.llm_timeout_ms),
            llm_retry_attempts: parse_or(&lookup, "LLM_RETRY_ATTEMPTS", defaults.llm_retry_attempts),
            llm_retry_base_delay_ms: parse_or(&lookup, "LLM_RETRY_BASE_DELAY_MS", defaults.llm_retry_base_delay_ms),
            llm_retry_max_delay_ms: parse_or(&lookup, "LLM_RETRY_MAX_DELAY_MS", defaults.llm_retry_max_delay_ms),
            max_validate_retry: parse_or(&lookup, "MAX_VALIDATE_RETRY", defaults.max_validate_retry),
            max_size: parse_or(&lookup, "MAX_SIZE", defaults.max_size),
            max_from_size: parse_or(&lookup, "MAX_FROM_SIZE", defaults.max_from_size),
            default_timeout_ms: parse_or(&lookup, "DEFAULT_TIMEOUT_MS", defaults.default_timeout_ms),
            pipeline_call_timeout_ms: lookup("PIPELINE_CALL_TIMEOUT_MS").and_then(|v| v.parse().ok()),
            field_catalog_path: lookup("FIELD_CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.field_catalog_path),
        })
    }

    pub fn llm_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.llm_retry_attempts,
            Duration::from_millis(self.llm_retry_base_delay_ms),
            Duration::from_millis(self.llm_retry_max_delay_ms),
            0.25,
        )
    }

    pub fn pipeline_call_timeout(&self) -> Option<Duration> {
        self.pipeline_call_timeout_ms.map(Duration::from_millis)
    }
}

// Unparseable values fall back to the default
fn parse_or<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
