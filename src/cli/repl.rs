//! Interactive session driver.
//!
//! Reads one prompt per iteration, hands it to the orchestrator, prints the
//! answer and repeats. The loop ends at end of input; any orchestrator error
//! ends it too and is returned to the caller.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use rustyline::config::{Config, EditMode};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Runtime;
use tracing::warn;

use crate::agent::orchestrator::Orchestrator;
use crate::error::{CommandError, Result};

/// Maximum number of entries kept in the history file.
pub const MAX_HISTORY: usize = 500;
/// Prompt shown for a new block.
pub const PROMPT: &str = "> ";
/// Prompt shown for continuation lines.
pub const CONTINUATION_PROMPT: &str = ". ";
/// Shown once when the session starts.
pub const BANNER: &str = "(End a line with \\ to continue on the next one. Ctrl-D to quit.)";

/// One raw line from an input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line of text without its newline.
    Line(String),
    /// The user pressed Ctrl-C.
    Interrupted,
    /// No more input.
    Eof,
}

/// A source of prompt lines.
pub trait LineSource {
    /// Reads one line, showing `prompt` if the source is interactive.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the underlying reader fails.
    fn read_line(&mut self, prompt: &str) -> std::result::Result<Input, CommandError>;

    /// Records a submitted prompt in the source's history, if it keeps one.
    fn remember(&mut self, _prompt: &str) {}
}

/// Reads one prompt, joining lines that end in `\`.
///
/// Ctrl-C discards the block being typed and starts over. Returns `None` at
/// end of input.
///
/// # Errors
///
/// Propagates errors from the line source.
pub fn read_prompt<S: LineSource + ?Sized>(
    source: &mut S,
) -> std::result::Result<Option<String>, CommandError> {
    let mut block = String::new();
    loop {
        let prompt = if block.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };
        match source.read_line(prompt)? {
            Input::Line(line) => {
                if let Some(head) = line.strip_suffix('\\') {
                    block.push_str(head);
                    block.push('\n');
                    continue;
                }
                block.push_str(&line);
                source.remember(&block);
                return Ok(Some(block));
            }
            Input::Interrupted => block.clear(),
            Input::Eof => return Ok(None),
        }
    }
}

/// Line source over any buffered reader (pipes, files, tests).
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wraps a reader.
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> std::result::Result<Input, CommandError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Input::Eof);
        }
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        Ok(Input::Line(trimmed.to_string()))
    }
}

/// Interactive line source backed by rustyline, with a capped history file.
pub struct EditorSource {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl EditorSource {
    /// Creates the editor, loading history from `history_path` if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Readline`] if the terminal cannot be set up.
    pub fn new(
        vi_mode: bool,
        history_path: Option<PathBuf>,
    ) -> std::result::Result<Self, CommandError> {
        let edit_mode = if vi_mode { EditMode::Vi } else { EditMode::Emacs };
        let config = Config::builder()
            .max_history_size(MAX_HISTORY)?
            .history_ignore_space(true)
            .edit_mode(edit_mode)
            .build();
        let mut editor = DefaultEditor::with_config(config)?;
        if let Some(path) = history_path.as_deref().filter(|p| p.exists()) {
            if let Err(e) = editor.load_history(path) {
                warn!(path = %path.display(), "could not load history: {e}");
            }
        }
        Ok(Self {
            editor,
            history_path,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> std::result::Result<Input, CommandError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn remember(&mut self, prompt: &str) {
        let _ = self.editor.add_history_entry(prompt);
        if let Some(path) = &self.history_path {
            if let Err(e) = self.editor.save_history(path) {
                warn!(path = %path.display(), "could not save history: {e}");
            }
        }
    }
}

impl std::fmt::Debug for EditorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSource")
            .field("history_path", &self.history_path)
            .finish_non_exhaustive()
    }
}

/// Runs the read-respond-print loop until end of input.
///
/// Every prompt is sent as typed, blank ones included. Returns the number
/// of answered turns.
///
/// # Errors
///
/// Returns the first orchestrator, input or output error; the session does
/// not continue past it.
pub fn run_session<S, W>(
    runtime: &Runtime,
    orchestrator: &mut Orchestrator,
    source: &mut S,
    out: &mut W,
) -> Result<usize>
where
    S: LineSource + ?Sized,
    W: Write,
{
    let mut turns = 0;
    while let Some(prompt) = read_prompt(source)? {
        let answer = runtime.block_on(orchestrator.response(&prompt))?;
        writeln!(out, "\n{}\n", answer.content).map_err(CommandError::from)?;
        out.flush().map_err(CommandError::from)?;
        turns += 1;
    }
    Ok(turns)
}
