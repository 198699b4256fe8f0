//! Multi-agent prompting for chat models.
//!
//! Wraps a chat-completion endpoint in conversational agents and combines
//! them according to an interaction [`Mode`]. Uses a pluggable provider
//! abstraction backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! User prompt → Orchestrator
//!   ├── zero_shot     → main agent
//!   ├── step_by_step  → main agent, chain-of-thought wrapper
//!   └── resolver
//!       ├── N GeneratorAgents (seeded from main) → candidates
//!       ├── Researcher (seeded from main) → critique
//!       └── Resolver (seeded from researcher) → final answer
//! ```

pub mod config;
pub mod conversation;
pub mod message;
pub mod mode;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;

// Re-export key types
pub use config::{OrchestratorConfig, OrchestratorConfigBuilder};
pub use conversation::ConversationAgent;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use mode::{Mode, Verbosity};
pub use orchestrator::{Orchestrator, ResolverPanel, ResolverTurn, Strategy};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use providers::create_provider;
