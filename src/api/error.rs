use crate::error::CopilotError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-caused rejection from the execution gate
    #[error("High risk query blocked: {0:?}")]
    HighRisk(Vec<String>),

    /// Body that could not be read as the expected request
    #[error("{detail}")]
    InvalidRequest { status: StatusCode, detail: String },

    #[error("{0}")]
    Internal(#[from] CopilotError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::HighRisk(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorPayload {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let denied = ApiError::HighRisk(vec!["Scripting used".to_string()]);
        assert_eq!(denied.to_string(), r#"High risk query blocked: ["Scripting used"]"#);
        assert_eq!(denied.into_response().status(), StatusCode::FORBIDDEN);

        let fault = ApiError::from(CopilotError::Store("Search failed: boom".to_string()));
        assert_eq!(fault.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bad = ApiError::InvalidRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "dsl must be a JSON object".to_string(),
        };
        assert_eq!(bad.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
