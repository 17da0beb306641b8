//! Request and response bodies

use crate::query::Query;
use crate::services::SearchOutcome;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Accept only a JSON object as a query body.
fn mapping_query<'de, D>(deserializer: D) -> Result<Query, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(Query::from(value)),
        _ => Err(D::Error::custom("dsl must be a JSON object")),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftMode {
    #[default]
    Preview,
    Execute,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub index: String,
    pub nl_query: String,
    #[serde(default)]
    pub mode: DraftMode,
    #[serde(default)]
    pub user_context: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub index: String,
    #[serde(deserialize_with = "mapping_query")]
    pub dsl: Query,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub index: String,
    #[serde(deserialize_with = "mapping_query")]
    pub dsl: Query,
    /// Falls back to the configured default (2000ms)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub took: u64,
    pub timed_out: bool,
    pub hits: Value,
    pub aggs: Value,
    pub warnings: Vec<String>,
}

impl RunResponse {
    pub fn new(outcome: SearchOutcome, warnings: Vec<String>) -> Self {
        Self {
            took: outcome.took,
            timed_out: outcome.timed_out,
            hits: outcome.hits,
            aggs: outcome.aggregations,
            warnings,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub index: String,
    pub doc_id: String,
    #[serde(deserialize_with = "mapping_query")]
    pub dsl: Query,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dsl_must_be_object() {
        let request: RunRequest =
            serde_json::from_value(json!({"index": "orders", "dsl": {"size": 5}})).unwrap();
        assert_eq!(request.dsl.get("size").and_then(Query::as_f64), Some(5.0));
        assert_eq!(request.timeout_ms, None);

        for dsl in [json!([1, 2]), json!("match_all"), json!(7), Value::Null] {
            let err = serde_json::from_value::<ValidateRequest>(json!({"index": "orders", "dsl": dsl}))
                .unwrap_err();
            assert!(err.to_string().contains("dsl must be a JSON object"));
        }
    }
}
