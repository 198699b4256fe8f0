//! Orchestrator configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! It is built once at startup and handed to the [`Orchestrator`](super::Orchestrator);
//! nothing here is global.

use std::path::PathBuf;
use std::time::Duration;

use super::mode::{Mode, Verbosity};
use crate::error::{AgentError, ConfigError};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4";
/// Default temperature of each generator agent.
const DEFAULT_GENERATOR_TEMPERATURE: f32 = 0.7;
/// Default number of generator agents.
const DEFAULT_GENERATOR_COUNT: usize = 3;
/// Default researcher temperature.
const DEFAULT_RESEARCHER_TEMPERATURE: f32 = 0.5;
/// Default resolver (and main agent) temperature.
const DEFAULT_RESOLVER_TEMPERATURE: f32 = 0.5;
/// Fixed sleep after a rate-limit signal.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(20);
/// Upper bound accepted for any sampling temperature.
const MAX_TEMPERATURE: f32 = 2.0;

/// Configuration for one orchestrator instance.
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model shared by every agent.
    pub model: String,
    /// Interaction mode.
    pub mode: Mode,
    /// One temperature per generator; its length is the generator count.
    pub generator_temperatures: Vec<f32>,
    /// Researcher temperature.
    pub researcher_temperature: f32,
    /// Temperature shared by the resolver and the main agent.
    pub resolver_temperature: f32,
    /// Controls status output and the resolver's rationale clause.
    pub verbosity: Verbosity,
    /// Sleep between retries after a rate-limit signal.
    pub rate_limit_delay: Duration,
    /// Run generator calls concurrently instead of one after another.
    pub parallel_generators: bool,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
}

impl OrchestratorConfig {
    /// Creates a new builder for `OrchestratorConfig`.
    #[must_use]
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Number of generator agents used in resolver mode.
    #[must_use]
    pub fn num_generators(&self) -> usize {
        self.generator_temperatures.len()
    }

    /// Returns a copy of this configuration with a different mode.
    #[must_use]
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("mode", &self.mode)
            .field("generator_temperatures", &self.generator_temperatures)
            .field("researcher_temperature", &self.researcher_temperature)
            .field("resolver_temperature", &self.resolver_temperature)
            .field("verbosity", &self.verbosity)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("parallel_generators", &self.parallel_generators)
            .field("prompt_dir", &self.prompt_dir)
            .finish()
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    mode: Option<Mode>,
    generator_temperatures: Option<Vec<f32>>,
    researcher_temperature: Option<f32>,
    resolver_temperature: Option<f32>,
    verbosity: Option<Verbosity>,
    rate_limit_delay: Option<Duration>,
    parallel_generators: Option<bool>,
    prompt_dir: Option<PathBuf>,
}

impl OrchestratorConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("SMARTGPT_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("SMARTGPT_MODEL").ok();
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("SMARTGPT_PROMPT_DIR")
                .ok()
                .map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the interaction mode.
    #[must_use]
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the generator temperatures (one generator per entry).
    #[must_use]
    pub fn generator_temperatures(mut self, temps: Vec<f32>) -> Self {
        self.generator_temperatures = Some(temps);
        self
    }

    /// Sets the researcher temperature.
    #[must_use]
    pub const fn researcher_temperature(mut self, temp: f32) -> Self {
        self.researcher_temperature = Some(temp);
        self
    }

    /// Sets the resolver (and main agent) temperature.
    #[must_use]
    pub const fn resolver_temperature(mut self, temp: f32) -> Self {
        self.resolver_temperature = Some(temp);
        self
    }

    /// Sets the verbosity level.
    #[must_use]
    pub const fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    /// Sets the delay slept after a rate-limit signal.
    #[must_use]
    pub const fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = Some(delay);
        self
    }

    /// Enables or disables concurrent generator calls.
    #[must_use]
    pub const fn parallel_generators(mut self, parallel: bool) -> Self {
        self.parallel_generators = Some(parallel);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds and validates the [`OrchestratorConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the API key is missing, a
    /// temperature lies outside `0.0..=2.0`, or resolver mode is requested
    /// without any generators.
    pub fn build(self) -> Result<OrchestratorConfig, ConfigError> {
        let api_key = self.api_key.ok_or_else(|| ConfigError::InvalidValue {
            field: "api_key",
            message: AgentError::ApiKeyMissing.to_string(),
        })?;

        let config = OrchestratorConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            mode: self.mode.unwrap_or_default(),
            generator_temperatures: self
                .generator_temperatures
                .unwrap_or_else(|| vec![DEFAULT_GENERATOR_TEMPERATURE; DEFAULT_GENERATOR_COUNT]),
            researcher_temperature: self
                .researcher_temperature
                .unwrap_or(DEFAULT_RESEARCHER_TEMPERATURE),
            resolver_temperature: self
                .resolver_temperature
                .unwrap_or(DEFAULT_RESOLVER_TEMPERATURE),
            verbosity: self.verbosity.unwrap_or_default(),
            rate_limit_delay: self.rate_limit_delay.unwrap_or(DEFAULT_RATE_LIMIT_DELAY),
            parallel_generators: self.parallel_generators.unwrap_or(false),
            prompt_dir: self.prompt_dir,
        };

        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &OrchestratorConfig) -> Result<(), ConfigError> {
    check_temperature("researcher_temperature", config.researcher_temperature)?;
    check_temperature("resolver_temperature", config.resolver_temperature)?;
    for &temp in &config.generator_temperatures {
        check_temperature("generator_temperatures", temp)?;
    }

    if config.mode == Mode::Resolver && config.generator_temperatures.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "generator_temperatures",
            message: "resolver mode needs at least one generator".to_string(),
        });
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "model",
            message: "model identifier cannot be empty".to_string(),
        });
    }

    Ok(())
}

fn check_temperature(field: &'static str, temp: f32) -> Result<(), ConfigError> {
    if (0.0..=MAX_TEMPERATURE).contains(&temp) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            message: format!("{temp} is outside 0.0..={MAX_TEMPERATURE}"),
        })
    }
}
