//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::mode::{Mode, Verbosity};

/// smartgpt: multi-agent prompting for chat models.
///
/// Answers prompts zero-shot, step by step, or by having several generators
/// propose answers that a researcher critiques and a resolver improves.
#[derive(Parser, Debug)]
#[command(name = "smartgpt")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding settings, credentials and history.
    ///
    /// Defaults to `~/.smartgpt`.
    #[arg(long, env = "SMARTGPT_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Interaction mode for this run (overrides settings).
    #[arg(long, value_enum, global = true)]
    pub mode: Option<Mode>,

    /// Model identifier for this run (overrides settings).
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// How much of each turn to show (overrides settings).
    ///
    /// `none`: only the final response. `some`: status updates as the
    /// response is built. `all`: status updates plus every intermediary
    /// response, and the resolver explains which option it preferred.
    #[arg(long, value_enum, global = true)]
    pub verbosity: Option<Verbosity>,

    /// Use vi key bindings in the chat prompt.
    #[arg(long, global = true)]
    pub vi: bool,

    /// Ask the generators concurrently.
    #[arg(long, global = true)]
    pub parallel: bool,

    /// The subcommand to execute. Defaults to `chat`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session.
    #[command(after_help = r#"Examples:
  smartgpt                           # Chat with the settings in ~/.smartgpt
  smartgpt --mode step_by_step chat  # Chain-of-thought only
  echo "Is 91 prime?" | smartgpt chat
"#)]
    Chat,

    /// Answer a single prompt and exit.
    #[command(after_help = r#"Examples:
  smartgpt ask "What weighs more, a kilo of steel or a kilo of feathers?"
  smartgpt --mode zero_shot --model gpt-3.5-turbo ask "Hello"
  smartgpt --verbosity all ask "Explain the Monty Hall problem"
"#)]
    Ask {
        /// The prompt to answer.
        prompt: String,
    },

    /// Show the resolved settings.
    Settings,

    /// Create the settings directory, fallback settings and a credentials file.
    Init,

    /// Write default prompt templates to disk for customization.
    ///
    /// Existing files are never overwritten.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  smartgpt init-prompts                     # Write to ~/.smartgpt/prompts/
  smartgpt init-prompts --dir ./my-prompts  # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Compare the three modes on multiple-choice questions.
    ///
    /// Questions are read from a JSON Lines file with the fields `subject`,
    /// `question`, `A`, `B`, `C`, `D` and `answer`. One graded row per
    /// question is appended to the output file.
    #[command(after_help = r#"Examples:
  smartgpt bench --questions mmlu.jsonl --output scores.jsonl -n 10
  smartgpt bench --questions mmlu.jsonl --output scores.jsonl -n 5 --subject college_physics
"#)]
    Bench {
        /// JSON Lines file of questions.
        #[arg(long)]
        questions: PathBuf,

        /// JSON Lines scoresheet to append to.
        #[arg(long)]
        output: PathBuf,

        /// Number of questions per subject.
        #[arg(short = 'n', long = "per-subject")]
        per_subject: usize,

        /// Only use this subject.
        #[arg(long)]
        subject: Option<String>,
    },
}

impl Cli {
    /// The command to run, `chat` when none was given.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        <Cli as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_chat() {
        let cli = Cli::try_parse_from(["smartgpt"]).unwrap_or_else(|_| unreachable!());
        assert!(matches!(cli.command(), Commands::Chat));
        assert!(cli.mode.is_none());
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "smartgpt",
            "ask",
            "hi",
            "--mode",
            "step_by_step",
            "--verbosity",
            "all",
            "--model",
            "gpt-4o",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.mode, Some(Mode::StepByStep));
        assert_eq!(cli.verbosity, Some(Verbosity::All));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert!(matches!(cli.command(), Commands::Ask { ref prompt } if prompt == "hi"));
    }

    #[test]
    fn test_bench_args() {
        let cli = Cli::try_parse_from([
            "smartgpt",
            "bench",
            "--questions",
            "q.jsonl",
            "--output",
            "s.jsonl",
            "-n",
            "3",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            cli.command(),
            Commands::Bench { per_subject: 3, subject: None, .. }
        ));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["smartgpt", "--mode", "turbo"]).is_err());
    }
}
