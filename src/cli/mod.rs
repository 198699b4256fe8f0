//! CLI layer for smartgpt.
//!
//! Provides the command-line interface using clap, with commands for
//! chatting, one-shot answers, settings management and benchmarking.

pub mod commands;
pub mod parser;
pub mod repl;

pub use commands::execute;
pub use parser::{Cli, Commands};
pub use repl::{EditorSource, LineSource, ReaderSource, run_session};
