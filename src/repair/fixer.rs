//! Repair Loop
//!
//! Bounded validate → repair → re-validate loop. The validator is the only
//! authority on validity; the generator proposes whole replacement queries.
//! The loop never fails: exhaustion and generator faults come back as an
//! invalid `RepairResult` carrying the last validation error.

use crate::error::{CopilotError, Result};
use crate::query::Query;
use crate::repair::instruction::repair_instruction;
use crate::services::{Generator, ValidationOutcome, Validator};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Terminal output of one `validate_and_fix` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairResult {
    pub valid: bool,
    /// Last query that went through validation
    pub final_query: Query,
    /// Empty on success, otherwise the most recent validation error only
    pub errors: Vec<String>,
    pub was_repaired: bool,
}

#[derive(Debug)]
enum RepairState {
    Validating,
    Repairing { error: String },
    Succeeded,
    Failed { error: String },
}

pub struct RepairLoop {
    validator: Arc<dyn Validator>,
    generator: Arc<dyn Generator>,
    call_timeout: Option<Duration>,
}

impl RepairLoop {
    pub fn new(validator: Arc<dyn Validator>, generator: Arc<dyn Generator>) -> Self {
        Self {
            validator,
            generator,
            call_timeout: None,
        }
    }

    /// Bound every validator and generator call. A call that runs out of time
    /// counts as a failure of that call.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Validate `query`, repairing it at most `max_retries` times.
    pub async fn validate_and_fix(&self, index: &str, query: Query, max_retries: u32) -> RepairResult {
        let mut current = query;
        let mut attempt = 0u32;
        let mut was_repaired = false;
        let mut state = RepairState::Validating;

        loop {
            state = match state {
                RepairState::Validating => {
                    let outcome = self.check(index, &current).await;
                    if outcome.valid {
                        RepairState::Succeeded
                    } else {
                        let error = outcome.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                        info!("Validation failed for {} (attempt {}): {}", index, attempt, error);
                        if attempt < max_retries {
                            RepairState::Repairing { error }
                        } else {
                            RepairState::Failed { error }
                        }
                    }
                }
                RepairState::Repairing { error } => {
                    let repaired = self.repair(&error, &current).await;
                    match repaired {
                        Ok(replacement) => {
                            current = replacement;
                            was_repaired = true;
                            attempt += 1;
                            RepairState::Validating
                        }
                        Err(e) => {
                            warn!("Repair aborted, generator failed: {}", e);
                            RepairState::Failed { error }
                        }
                    }
                }
                RepairState::Succeeded => {
                    info!("Query valid for {} after {} repair(s)", index, attempt);
                    return RepairResult {
                        valid: true,
                        final_query: current,
                        errors: Vec::new(),
                        was_repaired,
                    };
                }
                RepairState::Failed { error } => {
                    return RepairResult {
                        valid: false,
                        final_query: current,
                        errors: vec![error],
                        was_repaired,
                    };
                }
            };
        }
    }

    /// Validator call folded into an outcome; backend failures read as invalid.
    async fn check(&self, index: &str, query: &Query) -> ValidationOutcome {
        match self.bounded("validator", self.validator.validate(index, query)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Validator unavailable: {}", e);
                ValidationOutcome::invalid(e.to_string())
            }
        }
    }

    async fn repair(&self, error: &str, query: &Query) -> Result<Query> {
        let prompt = repair_instruction(error, query);
        let replacement = self.bounded("generator", self.generator.generate(&prompt)).await?;
        Ok(replacement.unwrap_wrapped())
    }

    async fn bounded<T, F>(&self, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| CopilotError::Timeout(format!("{} call exceeded {:?}", what, limit)))?,
            None => call.await,
        }
    }
}
