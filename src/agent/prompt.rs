//! Prompt templates and renderers for each interaction mode.
//!
//! Templates are plain text with `{name}` placeholders. They are loaded once
//! (from a directory when configured, otherwise compiled-in) and rendered by
//! pure functions, so identical inputs always give identical prompts.

use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Chain-of-thought wrapper around the user's prompt. Placeholder: `{prompt}`.
pub const STEP_BY_STEP_TEMPLATE: &str = "Question: {prompt}

Answer: Let's work this out in a step by step way to be sure we have the right answer.";

/// Researcher critique prompt.
///
/// Placeholders: `{N}` candidate count, `{question}` the original prompt,
/// `{answer_list}` the numbered candidates.
pub const RESEARCHER_TEMPLATE: &str = "You are a researcher tasked with investigating the {N} response options provided. List the flaws and faulty logic of each answer option. Let's work this out in a step by step way to be sure we have all the errors.

The question was:

{question}

{answer_list}";

/// Resolver synthesis prompt.
///
/// Placeholders: `{N}` candidate count, `{rationale}` the optional clause
/// asking the model to leave out its reasoning.
pub const RESOLVER_TEMPLATE: &str = "You are a resolver tasked with 1) finding which of the {N} answer options the researcher thought was best, 2) improving that answer, and 3) printing the improved answer in full.{rationale} Let's work this out in a step by step way to be sure we have the right answer:";

/// Clause inserted into the resolver prompt when rationale is suppressed.
pub const SUPPRESS_RATIONALE_CLAUSE: &str = " Do not explain which option you chose or why, and do not include your step-by-step reasoning: your final output must contain only the improved answer.";

/// Default prompt directory under the user's smartgpt home.
const DEFAULT_PROMPT_SUBDIR: &str = "prompts";

/// Filename for the step-by-step template.
const STEP_BY_STEP_FILENAME: &str = "step_by_step.txt";
/// Filename for the researcher template.
const RESEARCHER_FILENAME: &str = "researcher.txt";
/// Filename for the resolver template.
const RESOLVER_FILENAME: &str = "resolver.txt";

/// The set of templates used by one orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Step-by-step template.
    pub step_by_step: String,
    /// Researcher template.
    pub researcher: String,
    /// Resolver template.
    pub resolver: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads templates from `prompt_dir`, falling back to compiled-in defaults.
    ///
    /// Each file is loaded independently; a missing or unreadable file uses
    /// its default. Surrounding whitespace is trimmed.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let load_file = |filename: &str, default: &str| -> String {
            prompt_dir
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .map_or_else(|| default.to_string(), |s| s.trim().to_string())
        };

        Self {
            step_by_step: load_file(STEP_BY_STEP_FILENAME, STEP_BY_STEP_TEMPLATE),
            researcher: load_file(RESEARCHER_FILENAME, RESEARCHER_TEMPLATE),
            resolver: load_file(RESOLVER_FILENAME, RESOLVER_TEMPLATE),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            step_by_step: STEP_BY_STEP_TEMPLATE.to_string(),
            researcher: RESEARCHER_TEMPLATE.to_string(),
            resolver: RESOLVER_TEMPLATE.to_string(),
        }
    }

    /// Writes the compiled-in templates to `dir`.
    ///
    /// Creates the directory if needed. Existing files are **not**
    /// overwritten; the returned list holds only the files written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (STEP_BY_STEP_FILENAME, STEP_BY_STEP_TEMPLATE),
            (RESEARCHER_FILENAME, RESEARCHER_TEMPLATE),
            (RESOLVER_FILENAME, RESOLVER_TEMPLATE),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Default template directory inside a smartgpt home directory.
    #[must_use]
    pub fn default_dir(home: &Path) -> PathBuf {
        home.join(DEFAULT_PROMPT_SUBDIR)
    }

    /// Wraps `prompt` in the step-by-step template.
    #[must_use]
    pub fn step_by_step(&self, prompt: &str) -> String {
        render(&self.step_by_step, &[("prompt", prompt)])
    }

    /// Builds the researcher's critique prompt for the ordered candidates.
    #[must_use]
    pub fn researcher(&self, question: &str, candidates: &[String]) -> String {
        let count = candidates.len().to_string();
        let answer_list = answer_list(candidates);
        render(
            &self.researcher,
            &[
                ("N", count.as_str()),
                ("question", question),
                ("answer_list", answer_list.as_str()),
            ],
        )
    }

    /// Builds the resolver's synthesis prompt.
    ///
    /// Candidates are not embedded; the resolver sees them through the
    /// researcher history it inherits.
    #[must_use]
    pub fn resolver(&self, candidate_count: usize, suppress_rationale: bool) -> String {
        let count = candidate_count.to_string();
        let rationale = if suppress_rationale {
            SUPPRESS_RATIONALE_CLAUSE
        } else {
            ""
        };
        render(
            &self.resolver,
            &[("N", count.as_str()), ("rationale", rationale)],
        )
    }
}

/// Numbers candidates from 1 as `Option k:` blocks separated by blank lines.
fn answer_list(candidates: &[String]) -> String {
    let mut out = String::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        if idx > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "Option {}:\n\n{candidate}", idx + 1);
    }
    out
}

/// Substitutes `{name}` placeholders in a single left-to-right pass.
///
/// Substituted text is never rescanned, so a user prompt containing `{N}`
/// comes through verbatim. Unknown placeholders are left as they are.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out
}
