//! Elasticsearch client
//!
//! Thin REST client used as validator, executor and catalog source.

use crate::config::Settings;
use crate::error::{CopilotError, Result};
use crate::query::Query;
use crate::services::{ExplainOutcome, Executor, SearchOutcome, ValidationOutcome, Validator};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Slack on top of the server-side search timeout before the HTTP call gives up
const SEARCH_TIMEOUT_GRACE: Duration = Duration::from_secs(1);

pub struct EsClient {
    client: Client,
    base_url: Url,
    user: String,
    password: String,
}

impl EsClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.default_timeout_ms))
            .danger_accept_invalid_certs(settings.es_accept_invalid_certs)
            .build()
            .map_err(|e| CopilotError::Config(format!("Failed to build ES client: {}", e)))?;
        let base_url = Url::parse(&settings.es_url)
            .map_err(|e| CopilotError::Config(format!("Invalid ES_URL {}: {}", settings.es_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CopilotError::Config(format!("Invalid ES_URL {}", settings.es_url)));
        }

        Ok(Self {
            client,
            base_url,
            user: settings.es_user.clone(),
            password: settings.es_password.clone(),
        })
    }

    /// Endpoint under the base URL. Every segment is percent-encoded, so
    /// index names and document ids cannot reshape the path or query.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(segments))
            .basic_auth(&self.user, Some(&self.password))
    }

    /// Send a request and return the JSON body, mapping any failure to a store error.
    async fn send_json(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| CopilotError::Store(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let reason = error_reason(&body).unwrap_or_else(|| format!("HTTP {}", status));
            return Err(CopilotError::Store(format!("{} failed: {}", what, reason)));
        }
        Ok(body)
    }

    pub async fn mapping(&self, index: &str) -> Result<Value> {
        let builder = self.request(Method::GET, &[index, "_mapping"]);
        self.send_json(builder, &format!("Get mapping for {}", index)).await
    }

    pub async fn field_caps(&self, index: &str) -> Result<Value> {
        let builder = self
            .request(Method::GET, &[index, "_field_caps"])
            .query(&[("fields", "*")]);
        self.send_json(builder, &format!("Get field caps for {}", index)).await
    }
}

#[async_trait]
impl Validator for EsClient {
    async fn validate(&self, index: &str, query: &Query) -> Result<ValidationOutcome> {
        let response = self
            .request(Method::POST, &[index, "_validate", "query"])
            .query(&[("explain", "true")])
            .json(query)
            .send()
            .await;

        // Every failure mode here is an ordinary invalid outcome
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("Validate request to ES failed: {}", e);
                return Ok(ValidationOutcome::invalid(e.to_string()));
            }
        };

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let reason = error_reason(&body).unwrap_or_else(|| format!("HTTP {}", status));
            return Ok(ValidationOutcome::invalid(reason));
        }

        if body.get("valid").and_then(Value::as_bool).unwrap_or(false) {
            debug!("ES accepted query for {}", index);
            Ok(ValidationOutcome::valid())
        } else {
            Ok(ValidationOutcome::invalid(validation_error(&body)))
        }
    }
}

#[async_trait]
impl Executor for EsClient {
    async fn run(&self, index: &str, query: &Query, timeout: Duration) -> Result<SearchOutcome> {
        let builder = self
            .request(Method::POST, &[index, "_search"])
            .query(&[("timeout", format!("{}ms", timeout.as_millis()))])
            .timeout(timeout + SEARCH_TIMEOUT_GRACE)
            .json(query);
        let body = self.send_json(builder, "Search").await?;

        Ok(SearchOutcome {
            took: body.get("took").and_then(Value::as_u64).unwrap_or(0),
            timed_out: body.get("timed_out").and_then(Value::as_bool).unwrap_or(false),
            hits: body.get("hits").cloned().unwrap_or_else(|| json!({})),
            aggregations: body.get("aggregations").cloned().unwrap_or_else(|| json!({})),
        })
    }

    async fn explain(&self, index: &str, doc_id: &str, query: &Query) -> Result<ExplainOutcome> {
        let builder = self
            .request(Method::POST, &[index, "_explain", doc_id])
            .json(query);
        let body = self.send_json(builder, "Explain").await?;

        Ok(ExplainOutcome {
            matched: body.get("matched").and_then(Value::as_bool).unwrap_or(false),
            explanation: body.get("explanation").cloned().unwrap_or_else(|| json!({})),
        })
    }

    async fn ping(&self) -> bool {
        let ping = self
            .client
            .head(self.base_url.clone())
            .basic_auth(&self.user, Some(&self.password));
        match ping.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("ES ping failed: {}", e);
                false
            }
        }
    }
}

fn error_reason(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("reason")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

fn validation_error(body: &Value) -> String {
    body.get("explanations")
        .and_then(Value::as_array)
        .and_then(|items| items.iter().find_map(|e| e.get("error").and_then(Value::as_str)))
        .map(str::to_string)
        .or_else(|| error_reason(body))
        .unwrap_or_else(|| "Unknown error".to_string())
}
