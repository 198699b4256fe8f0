//! LLM grader for multiple-choice answers.

use std::sync::Arc;

use tracing::warn;

use crate::agent::config::OrchestratorConfig;
use crate::agent::conversation::ConversationAgent;
use crate::agent::message::system_message;
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// System prompt restricting the grader to two possible outputs.
pub const GRADER_SYSTEM_PROMPT: &str = "You grade multiple choice questions. You will always be given the correct answer (A, B, C, or D) as well as the student's answer, which may contain logic and justification for. Your job is to scan their answer and determine whether or not the student got the right answer unambiguously. You should produce machine-like output, and are only capable of two responses: 'correct' or 'incorrect'.";

/// Sampling temperature of the grader.
const GRADER_TEMPERATURE: f32 = 0.5;

/// Verdict on one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grade {
    /// The student picked the right option.
    Correct,
    /// The student picked a wrong option.
    Incorrect,
    /// The grader said something other than `correct` or `incorrect`.
    Ambiguous(String),
}

impl Grade {
    /// Interprets the grader's reply. Case, surrounding whitespace and a
    /// trailing period are ignored.
    #[must_use]
    pub fn parse(reply: &str) -> Self {
        let normalized = reply.trim().trim_end_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "correct" => Self::Correct,
            "incorrect" => Self::Incorrect,
            _ => Self::Ambiguous(reply.to_string()),
        }
    }

    /// Ambiguous grades count as incorrect.
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Builds the grader's user prompt.
#[must_use]
pub fn grader_prompt(response: &str, answer: &str) -> String {
    format!("The correct answer is {answer}.\n\nThe student wrote:\n\n{response}")
}

/// Grades answers with a fresh agent per answer.
pub struct Grader {
    provider: Arc<dyn LlmProvider>,
    model: String,
    rate_limit_delay: std::time::Duration,
}

impl Grader {
    /// Creates a grader using the config's model.
    pub fn new(provider: Arc<dyn LlmProvider>, config: &OrchestratorConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            rate_limit_delay: config.rate_limit_delay,
        }
    }

    /// Grades `response` against the correct option letter.
    ///
    /// # Errors
    ///
    /// Propagates provider errors; an ambiguous reply is not an error.
    pub async fn grade(&self, response: &str, answer: &str) -> Result<Grade, AgentError> {
        let mut agent = ConversationAgent::new(
            "grader",
            Arc::clone(&self.provider),
            self.model.as_str(),
            GRADER_TEMPERATURE,
        )
        .with_rate_limit_delay(self.rate_limit_delay)
        .with_history(vec![system_message(GRADER_SYSTEM_PROMPT)]);

        let reply = agent.respond(&grader_prompt(response, answer)).await?;
        let grade = Grade::parse(&reply.content);
        if let Grade::Ambiguous(text) = &grade {
            warn!(reply = %text, "grader did not answer 'correct' or 'incorrect', scoring as incorrect");
        }
        Ok(grade)
    }
}

impl std::fmt::Debug for Grader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grader")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
