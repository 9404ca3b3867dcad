//! Text generation client used by the analysis worker.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiClient;

/// One chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// Out of credit or rate limited.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Requests are refused, typically because of the caller's region.
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("{message}")]
    Other { message: String, retryable: bool },
}

impl LlmError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            retryable: true,
        }
    }

    /// Only transport-level and server-side failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Other { retryable: true, .. })
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            LlmError::transient(format!("HTTP request failed: {err}"))
        } else {
            LlmError::other(format!("HTTP request failed: {err}"))
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
