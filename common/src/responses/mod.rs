use serde::{Deserialize, Serialize};

/// Body returned by the ingestion endpoint once a submission is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub message: String,
    /// Id of the analysis task, usable with `/api/analysis/status/{task_id}`.
    pub task_id: Option<String>,
    /// Whether the analysis task made it onto the queue.
    pub queued: bool,
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_omits_missing_details() {
        let body = serde_json::to_value(ErrorResponse::new("boom", None)).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "boom" }));
    }

    #[test]
    fn error_response_keeps_details() {
        let body =
            serde_json::to_value(ErrorResponse::new("boom", Some("why".to_string()))).unwrap();
        assert_eq!(body["details"], "why");
    }
}
