use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM transport error: {0}")]
    LlmTransport(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Field catalog error: {0}")]
    Catalog(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CopilotError {
    /// Whether a retry of the same call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CopilotError::LlmTransport(_) | CopilotError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, CopilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CopilotError::LlmTransport("connection reset".to_string()).is_transient());
        assert!(CopilotError::Timeout("llm".to_string()).is_transient());
        assert!(!CopilotError::Llm("LLM returned invalid JSON".to_string()).is_transient());
        assert!(!CopilotError::Store("search failed".to_string()).is_transient());
    }
}
