use crate::api::dto::{DraftRequest, ExplainRequest, RunRequest, RunResponse, ValidateRequest};
use crate::api::{ApiError, AppState};
use crate::copilot::{Draft, Health, RunOutcome, ValidationReport};
use crate::services::ExplainOutcome;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::debug;

pub async fn draft(
    State(copilot): State<AppState>,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Result<Json<Draft>, ApiError> {
    let Json(request) = payload?;
    // mode does not change drafting yet
    debug!(mode = ?request.mode, "draft requested");
    let context = Value::Object(request.user_context);
    let draft = copilot.draft(&request.index, &request.nl_query, &context).await?;
    Ok(Json(draft))
}

pub async fn validate(
    State(copilot): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidationReport>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(copilot.validate(&request.index, request.dsl).await))
}

pub async fn run(
    State(copilot): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, ApiError> {
    let Json(request) = payload?;
    match copilot.run(&request.index, request.dsl, request.timeout_ms).await? {
        RunOutcome::Executed { outcome, warnings } => Ok(Json(RunResponse::new(outcome, warnings))),
        RunOutcome::Rejected { reasons } => Err(ApiError::HighRisk(reasons)),
    }
}

pub async fn explain(
    State(copilot): State<AppState>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainOutcome>, ApiError> {
    let Json(request) = payload?;
    let outcome = copilot.explain(&request.index, &request.doc_id, &request.dsl).await?;
    Ok(Json(outcome))
}

pub async fn health(State(copilot): State<AppState>) -> Json<Health> {
    Json(copilot.health().await)
}
