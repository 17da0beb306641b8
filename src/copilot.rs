//! Copilot
//!
//! Composition root tying the catalog, the repair loop, the execution gate and
//! the external collaborators into the five service operations.

use crate::catalog::FieldCatalog;
use crate::config::Settings;
use crate::error::Result;
use crate::gate::{Decision, ExecutionGate};
use crate::prompt::draft_system_prompt;
use crate::query::Query;
use crate::repair::RepairLoop;
use crate::services::{
    EsClient, Executor, ExplainOutcome, Generator, LlmClient, Prompt, SearchOutcome, Validator,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Catalog context handed to the drafting prompt is cut at this many characters
pub const MAX_CATALOG_CHARS: usize = 10_000;
const DRAFT_TEMPERATURE: f64 = 0.1;
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_SIZE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Draft {
    pub dsl: Value,
    pub explanation: Vec<String>,
    pub risk: Value,
    pub confidence: f64,
}

impl Draft {
    /// Pull the draft fields out of a generator answer, defaulting what is missing.
    fn from_generated(generated: Query) -> Self {
        let value = Value::from(generated);
        Self {
            dsl: value.get("dsl").cloned().unwrap_or_else(|| json!({})),
            explanation: value
                .get("explanation")
                .and_then(Value::as_array)
                .map(|steps| {
                    steps
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            risk: value
                .get("risk")
                .cloned()
                .unwrap_or_else(|| json!({"level": "unknown", "reasons": []})),
            confidence: value.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub auto_fixed: bool,
    /// Present only when the query was repaired
    pub fixed_dsl: Option<Query>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Executed {
        outcome: SearchOutcome,
        warnings: Vec<String>,
    },
    /// Refused by the gate; the query never reached the store
    Rejected { reasons: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub elasticsearch: &'static str,
    pub version: &'static str,
}

pub struct Copilot {
    catalog: FieldCatalog,
    generator: Arc<dyn Generator>,
    executor: Arc<dyn Executor>,
    repair: RepairLoop,
    gate: ExecutionGate,
    max_validate_retry: u32,
    max_size: u64,
    max_from_size: u64,
    default_timeout: Duration,
}

impl Copilot {
    pub fn new(
        settings: &Settings,
        catalog: FieldCatalog,
        validator: Arc<dyn Validator>,
        generator: Arc<dyn Generator>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let repair = RepairLoop::new(validator, Arc::clone(&generator))
            .with_call_timeout(settings.pipeline_call_timeout());
        Self {
            catalog,
            generator,
            executor,
            repair,
            gate: ExecutionGate::default(),
            max_validate_retry: settings.max_validate_retry,
            max_size: settings.max_size,
            max_from_size: settings.max_from_size,
            default_timeout: Duration::from_millis(settings.default_timeout_ms),
        }
    }

    /// Wire the HTTP collaborators and the on-disk catalog.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let es = Arc::new(EsClient::new(settings)?);
        let llm = Arc::new(LlmClient::new(settings)?);
        let catalog = FieldCatalog::load(&settings.field_catalog_path)?;
        Ok(Self::new(settings, catalog, es.clone(), llm, es))
    }

    pub async fn draft(&self, index: &str, nl_query: &str, user_context: &Value) -> Result<Draft> {
        let field_count = self.catalog.field_count(index);
        if field_count == 0 {
            warn!("No catalog fields for {}; drafting without field context", index);
        }
        let timezone = user_context
            .get("timezone")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TIMEZONE);

        let prompt = Prompt {
            system: draft_system_prompt(index, timezone, &self.catalog.truncated_json(index, MAX_CATALOG_CHARS)),
            user: nl_query.to_string(),
            temperature: DRAFT_TEMPERATURE,
        };

        info!("Drafting query for {} with {} catalog fields", index, field_count);
        let generated = self.generator.generate(&prompt).await?;
        Ok(Draft::from_generated(generated))
    }

    pub async fn validate(&self, index: &str, query: Query) -> ValidationReport {
        let result = self
            .repair
            .validate_and_fix(index, query, self.max_validate_retry)
            .await;
        ValidationReport {
            valid: result.valid,
            errors: result.errors,
            auto_fixed: result.was_repaired,
            fixed_dsl: result.was_repaired.then_some(result.final_query),
            warnings: Vec::new(),
        }
    }

    pub async fn run(&self, index: &str, mut query: Query, timeout_ms: Option<u64>) -> Result<RunOutcome> {
        if let Decision::Deny(reasons) = self.gate.authorize(&query) {
            return Ok(RunOutcome::Rejected { reasons });
        }

        let mut warnings = Vec::new();
        if let Some(size) = query.get("size").and_then(Query::as_f64) {
            if size > self.max_size as f64 {
                warnings.push(format!("size {} clamped to {}", size, self.max_size));
                query.set("size", Query::from(self.max_size));
            }
        }
        // result window overflow is reported, not rewritten
        let size = query.get("size").and_then(Query::as_f64).unwrap_or(DEFAULT_SIZE);
        let from = query.get("from").and_then(Query::as_f64).unwrap_or(0.0);
        if from + size > self.max_from_size as f64 {
            warnings.push(format!(
                "from+size {} exceeds result window {}",
                from + size,
                self.max_from_size
            ));
        }

        let timeout = timeout_ms.map_or(self.default_timeout, Duration::from_millis);
        let outcome = self.executor.run(index, &query, timeout).await?;
        info!("Search on {} took {}ms (timed out: {})", index, outcome.took, outcome.timed_out);
        Ok(RunOutcome::Executed { outcome, warnings })
    }

    pub async fn explain(&self, index: &str, doc_id: &str, query: &Query) -> Result<ExplainOutcome> {
        self.executor.explain(index, doc_id, query).await
    }

    pub async fn health(&self) -> Health {
        let elasticsearch = if self.executor.ping().await { "up" } else { "down" };
        Health {
            status: "ok",
            elasticsearch,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
