//! Boundary to the hosted text-completion service.

mod http;

pub use http::HttpCompletionClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Wire request: `{prompt: {system, user}, context}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: PromptPair,
    pub context: serde_json::Value,
}

/// Successful completion. `content` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion transport failed: {0}")]
    Transport(String),
    #[error("completion request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("completion service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("completion response was malformed: {0}")]
    MalformedBody(String),
    #[error("completion request cancelled")]
    Cancelled,
    #[error("completion service credentials are missing")]
    MissingCredentials,
}

/// One network call per invocation; no retries. Implementations fail closed:
/// anything short of a complete, well-formed body is an error.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn generate_analysis(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionResponse, CompletionError>;

    /// Model name reported in logs when the response omits one.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
