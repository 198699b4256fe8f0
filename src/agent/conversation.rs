//! Conversational agent: one linear history and the request/response cycle.
//!
//! Every successful [`ConversationAgent::respond`] appends exactly two
//! messages (the prompt, then the reply). Rate-limit signals are retried in
//! place after a fixed delay, with no cap; any other failure propagates and
//! leaves only the prompt appended.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::config::DEFAULT_RATE_LIMIT_DELAY;
use super::message::{ChatMessage, ChatRequest, ChatResponse, user_message};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// An agent holding one conversation history.
///
/// The provider handle and model are shared read-only between agents of
/// one orchestrator; history, token counts and temperature are private.
#[derive(Clone)]
pub struct ConversationAgent {
    name: String,
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    history: Vec<ChatMessage>,
    token_counts: BTreeMap<usize, u32>,
    rate_limit_delay: Duration,
}

impl ConversationAgent {
    /// Creates an agent with an empty history.
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            temperature,
            history: Vec::new(),
            token_counts: BTreeMap::new(),
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }

    /// Sets the sleep between retries after a rate-limit signal.
    #[must_use]
    pub const fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Starts the agent from an existing history (e.g. a system message).
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Agent name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sampling temperature.
    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    /// The full ordered history.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Total tokens reported by the endpoint, keyed by history length after each reply.
    pub const fn token_counts(&self) -> &BTreeMap<usize, u32> {
        &self.token_counts
    }

    /// Appends a message without contacting the endpoint.
    pub fn push(&mut self, message: ChatMessage) {
        self.history.push(message);
    }

    /// Replaces this agent's history and token counts with independent
    /// copies of `source`'s. Later turns on either agent never show up in
    /// the other.
    pub fn seed_from(&mut self, source: &Self) {
        self.history.clone_from(&source.history);
        self.token_counts.clone_from(&source.token_counts);
    }

    /// Appends `prompt` as a user message, sends the whole history and
    /// appends the reply.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedRequest`] when the endpoint rejects
    /// the request, or any other non-rate-limit provider error. On failure
    /// the prompt stays in the history and no reply is appended.
    pub async fn respond(&mut self, prompt: &str) -> Result<ChatMessage, AgentError> {
        self.history.push(user_message(prompt));

        let response = self.request().await?;

        self.history.push(response.message.clone());
        self.token_counts
            .insert(self.history.len(), response.usage.total_tokens);

        debug!(
            agent = %self.name,
            total_tokens = response.usage.total_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            history_len = self.history.len(),
            "turn complete"
        );

        Ok(response.message)
    }

    /// Sends the current history to the endpoint, retrying on rate limits.
    ///
    /// # Errors
    ///
    /// Propagates every provider error except [`AgentError::RateLimited`].
    pub async fn request(&self) -> Result<ChatResponse, AgentError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.history.clone(),
            temperature: Some(self.temperature),
        };

        loop {
            match self.provider.chat(&request).await {
                Err(AgentError::RateLimited { message }) => {
                    warn!(
                        agent = %self.name,
                        delay_secs = self.rate_limit_delay.as_secs(),
                        %message,
                        "hit rate limit, sleeping before retry"
                    );
                    tokio::time::sleep(self.rate_limit_delay).await;
                }
                other => return other,
            }
        }
    }
}

impl std::fmt::Debug for ConversationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationAgent")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}
