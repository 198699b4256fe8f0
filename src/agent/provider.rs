//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls and map endpoint failures onto
//! [`AgentError`]. Retrying is the caller's business.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// Trait for LLM provider backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RateLimited`] when the endpoint asks the caller
    /// to back off, [`AgentError::UnsupportedRequest`] when it rejects the
    /// request itself, and [`AgentError::ApiRequest`] for anything else.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
