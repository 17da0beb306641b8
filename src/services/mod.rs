//! External collaborators
//!
//! The pipeline only talks to the document store and the LLM through these
//! traits; `EsClient` and `LlmClient` are the HTTP implementations.

pub mod es_client;
pub mod llm_client;

pub use es_client::*;
pub use llm_client::*;

use crate::error::Result;
use crate::query::Query;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one validation call. Invalidity is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self { valid: true, error: None }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Prompt handed to a generator
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f64,
}

/// Search response as returned to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub took: u64,
    pub timed_out: bool,
    pub hits: serde_json::Value,
    pub aggregations: serde_json::Value,
}

/// Explain API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainOutcome {
    pub matched: bool,
    pub explanation: serde_json::Value,
}

/// Syntactic / semantic authority over queries.
#[async_trait]
pub trait Validator: Send + Sync {
    /// An `Err` means the backend could not be asked at all; callers fold it
    /// into an invalid outcome.
    async fn validate(&self, index: &str, query: &Query) -> Result<ValidationOutcome>;
}

/// Query generator (an LLM behind a JSON-only prompt).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<Query>;
}

/// Document store operations that run against live data.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(&self, index: &str, query: &Query, timeout: Duration) -> Result<SearchOutcome>;

    async fn explain(&self, index: &str, doc_id: &str, query: &Query) -> Result<ExplainOutcome>;

    /// Reachability check; never fails.
    async fn ping(&self) -> bool;
}
