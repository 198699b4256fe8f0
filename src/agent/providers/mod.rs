//! Concrete [`LlmProvider`] implementations and the factory that picks one.

pub mod openai;

use std::sync::Arc;

pub use openai::OpenAiProvider;

use crate::agent::config::OrchestratorConfig;
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Provider names accepted in `OrchestratorConfig::provider`.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai"];

/// Builds the provider named in the configuration.
///
/// Names are matched case-insensitively. The key is checked here, before
/// any agent exists, so a blank key fails at startup rather than on the
/// first request.
///
/// # Errors
///
/// Returns [`AgentError::ApiKeyMissing`] for an empty or whitespace key and
/// [`AgentError::UnsupportedProvider`] for a name not in
/// [`SUPPORTED_PROVIDERS`].
pub fn create_provider(config: &OrchestratorConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    if config.api_key.trim().is_empty() {
        return Err(AgentError::ApiKeyMissing);
    }

    match config.provider.to_ascii_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config))),
        _ => Err(AgentError::UnsupportedProvider {
            name: config.provider.clone(),
        }),
    }
}
