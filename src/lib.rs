//! # smartgpt
//!
//! Multi-agent prompting for chat-completion models.
//!
//! A prompt can be answered three ways:
//!
//! - **zero shot**: sent to the model as-is.
//! - **step by step**: wrapped in a chain-of-thought template first.
//! - **resolver**: several generator agents each answer the step-by-step
//!   prompt, a researcher agent lists the flaws of every candidate, and a
//!   resolver agent picks the best one, improves it and prints it.
//!
//! Each agent keeps its own conversation history. Branch agents start from
//! an independent copy of the main agent's history, so the main history
//! only ever records the prompt and the final answer.
//!
//! ## Example
//!
//! ```no_run
//! use smartgpt::agent::{Mode, Orchestrator, OrchestratorConfig, create_provider};
//!
//! # async fn run() -> smartgpt::Result<()> {
//! let config = OrchestratorConfig::builder()
//!     .from_env()
//!     .mode(Mode::Resolver)
//!     .build()?;
//! let provider = create_provider(&config)?;
//! let mut orchestrator = Orchestrator::new(provider, &config);
//!
//! let answer = orchestrator.response("Is 91 a prime number?").await?;
//! println!("{}", answer.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;
pub mod eval;
pub mod logging;
pub mod settings;

// Re-export commonly used types
pub use agent::{
    ChatMessage, ConversationAgent, LlmProvider, Mode, Orchestrator, OrchestratorConfig,
    PromptSet, Role, Verbosity,
};
pub use error::{AgentError, CommandError, ConfigError, Error, Result};
pub use settings::{Credentials, UserDir, UserSettings};
