//! LLM completion service seam
//!
//! The pipeline treats the LLM as text in, text out. The production client
//! lives in the server crate; tests substitute scripted implementations.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion service returned no content")]
    EmptyResponse,
}

/// One system + user exchange with fixed sampling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
