#![allow(dead_code)]

use async_trait::async_trait;
use es_query_copilot::error::{CopilotError, Result};
use es_query_copilot::query::Query;
use es_query_copilot::services::{
    ExplainOutcome, Executor, Generator, Prompt, SearchOutcome, ValidationOutcome, Validator,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Validator that replays a fixed list of outcomes, then reports invalid.
#[derive(Default)]
pub struct ScriptedValidator {
    outcomes: Mutex<VecDeque<ValidationOutcome>>,
    seen: Mutex<Vec<Query>>,
}

impl ScriptedValidator {
    pub fn new(outcomes: Vec<ValidationOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Query> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(&self, _index: &str, query: &Query) -> Result<ValidationOutcome> {
        self.seen.lock().unwrap().push(query.clone());
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ValidationOutcome::invalid("script exhausted")))
    }
}

/// Generator that replays scripted replies; `None` entries fail.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Option<Value>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Option<Value>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Query> {
        self.prompts.lock().unwrap().push(prompt.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(value)) => Ok(Query::from(value)),
            _ => Err(CopilotError::LlmTransport("LLM API call failed: connection reset".to_string())),
        }
    }
}

/// Executor that records every search and answers with a canned response.
pub struct RecordingExecutor {
    pub up: bool,
    pub fail: bool,
    runs: Mutex<Vec<(String, Query, Duration)>>,
    explains: AtomicUsize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            up: true,
            fail: false,
            runs: Mutex::new(Vec::new()),
            explains: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn down() -> Self {
        Self {
            up: false,
            ..Self::new()
        }
    }

    pub fn runs(&self) -> Vec<(String, Query, Duration)> {
        self.runs.lock().unwrap().clone()
    }

    pub fn explains(&self) -> usize {
        self.explains.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn run(&self, index: &str, query: &Query, timeout: Duration) -> Result<SearchOutcome> {
        self.runs
            .lock()
            .unwrap()
            .push((index.to_string(), query.clone(), timeout));
        if self.fail {
            return Err(CopilotError::Store("Search failed: all shards failed".to_string()));
        }
        Ok(SearchOutcome {
            took: 3,
            timed_out: false,
            hits: json!({"total": {"value": 1}, "hits": [{"_id": "1"}]}),
            aggregations: json!({}),
        })
    }

    async fn explain(&self, _index: &str, _doc_id: &str, _query: &Query) -> Result<ExplainOutcome> {
        self.explains.fetch_add(1, Ordering::SeqCst);
        Ok(ExplainOutcome {
            matched: true,
            explanation: json!({"value": 1.0, "description": "status:paid"}),
        })
    }

    async fn ping(&self) -> bool {
        self.up
    }
}
