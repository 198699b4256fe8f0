//! Error types for smartgpt.
//!
//! Errors are split by layer: [`AgentError`] for anything that happens while
//! talking to the model endpoint, [`ConfigError`] for startup-time problems
//! with settings and credentials, and [`CommandError`] for the CLI and REPL.
//! [`Error`] unifies them for callers that do not care which layer failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::agent::Mode;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Model endpoint or orchestration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Settings or credentials problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CLI or REPL failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by agents and the model provider.
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key was configured.
    #[error("API key missing: set OPENAI_API_KEY or add it to the credentials file")]
    ApiKeyMissing,

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// The endpoint signalled a transient rate limit.
    ///
    /// Conversational agents retry this themselves; it only escapes a
    /// provider, never [`ConversationAgent::respond`](crate::agent::ConversationAgent::respond).
    #[error("rate limited: {message}")]
    RateLimited {
        /// Endpoint message.
        message: String,
    },

    /// The endpoint rejected the request shape (context too long, malformed payload).
    #[error("unsupported request: {message}")]
    UnsupportedRequest {
        /// Endpoint message.
        message: String,
    },

    /// Any other endpoint failure.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error description.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The endpoint answered without any choices.
    #[error("model returned no choices")]
    EmptyResponse,

    /// An operation was called on an orchestrator in the wrong mode.
    #[error("resolve needs resolver mode, orchestrator is in {mode} mode")]
    WrongMode {
        /// Mode the orchestrator was built with.
        mode: Mode,
    },
}

/// Startup-time configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The user's home directory could not be determined.
    #[error("could not determine home directory; set SMARTGPT_HOME or pass --home")]
    NoHomeDir,

    /// A settings or credentials file is missing.
    #[error("{} is not a file", path.display())]
    NotFound {
        /// Expected location.
        path: PathBuf,
    },

    /// A settings file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The credentials file still holds the placeholder key.
    #[error(
        "Almost! In order to use smartgpt you need your OpenAI API key. Get yours at \
         https://platform.openai.com/account/api-keys, then open '{}' and replace \
         '{placeholder}' with your API key (or export OPENAI_API_KEY).",
        path.display()
    )]
    PlaceholderKey {
        /// Credentials file location.
        path: PathBuf,
        /// The placeholder value found in the file.
        placeholder: String,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Filesystem failure while reading or writing configuration.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Errors raised by CLI commands and the session driver.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// The line editor failed.
    #[error("readline error: {0}")]
    Readline(String),

    /// Output could not be written or formatted.
    #[error("output error: {0}")]
    Output(String),
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CommandError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Self::Readline(err.to_string())
    }
}
