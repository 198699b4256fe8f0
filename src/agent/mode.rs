//! Interaction modes and verbosity levels.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a prompt is turned into an answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Mode {
    /// Send the prompt as-is to the main agent.
    ZeroShot,
    /// Wrap the prompt in the step-by-step template first.
    StepByStep,
    /// Generators propose, a researcher critiques, a resolver synthesises.
    #[default]
    Resolver,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ZeroShot => "zero_shot",
            Self::StepByStep => "step_by_step",
            Self::Resolver => "resolver",
        };
        f.write_str(name)
    }
}

/// How much of a turn's inner workings is shown.
///
/// - `none`: only the final response.
/// - `some`: status updates as each stage of a resolver turn runs.
/// - `all`: status updates plus every intermediary response, and the
///   resolver is allowed to explain which option it preferred and why.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Final answer only.
    None,
    /// Stage-level status updates.
    #[default]
    Some,
    /// Everything, including intermediary responses.
    All,
}

impl Verbosity {
    /// Whether the resolver should be told to omit its rationale.
    #[must_use]
    pub const fn suppress_rationale(self) -> bool {
        !matches!(self, Self::All)
    }

    /// Default tracing filter directive for this level.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::None => "warn",
            Self::Some => "info",
            Self::All => "debug",
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Some => "some",
            Self::All => "all",
        };
        f.write_str(name)
    }
}
