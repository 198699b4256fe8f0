//! Multiple-choice benchmark questions.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One multiple-choice question with four options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Subject, with words joined by underscores (e.g. `college_physics`).
    pub subject: String,
    /// Question text.
    pub question: String,
    /// Option A.
    #[serde(rename = "A")]
    pub a: String,
    /// Option B.
    #[serde(rename = "B")]
    pub b: String,
    /// Option C.
    #[serde(rename = "C")]
    pub c: String,
    /// Option D.
    #[serde(rename = "D")]
    pub d: String,
    /// Letter of the correct option.
    pub answer: String,
}

/// A question with its position inside its subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedQuestion {
    /// Zero-based index within the subject.
    pub idx: usize,
    /// The question.
    pub question: Question,
}

impl Question {
    /// The options as `(letter, text)` pairs.
    pub fn options(&self) -> [(&'static str, &str); 4] {
        [
            ("A", self.a.as_str()),
            ("B", self.b.as_str()),
            ("C", self.c.as_str()),
            ("D", self.d.as_str()),
        ]
    }

    /// Renders the prompt sent to every competitor.
    #[must_use]
    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "Please choose the most correct answer for the following multiple choice \
             question about {}. {}\n\n",
            self.subject.replace('_', " "),
            self.question
        );
        for (letter, text) in self.options() {
            let _ = writeln!(prompt, "{letter}. {text}");
        }
        prompt
    }
}

/// Reads questions from a JSON Lines file. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] for a missing file and
/// [`ConfigError::Parse`] naming the first malformed line.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(lineno, line)| {
            serde_json::from_str(line).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: format!("line {}: {e}", lineno + 1),
            })
        })
        .collect()
}

/// Picks the first `per_subject` questions of each subject, or of `subject`
/// alone when given. Subjects come out in name order.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when `subject` has no questions or
/// any selected subject has fewer than `per_subject` questions.
pub fn select_questions(
    questions: &[Question],
    per_subject: usize,
    subject: Option<&str>,
) -> Result<Vec<IndexedQuestion>, ConfigError> {
    let mut by_subject: BTreeMap<&str, Vec<&Question>> = BTreeMap::new();
    for question in questions {
        by_subject
            .entry(question.subject.as_str())
            .or_default()
            .push(question);
    }

    if let Some(name) = subject {
        by_subject.retain(|key, _| *key == name);
        if by_subject.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "subject",
                message: format!("no questions for subject '{name}'"),
            });
        }
    }

    let mut selected = Vec::new();
    for (name, subject_questions) in by_subject {
        if subject_questions.len() < per_subject {
            return Err(ConfigError::InvalidValue {
                field: "questions",
                message: format!(
                    "'{name}' has {} questions, fewer than {per_subject}",
                    subject_questions.len()
                ),
            });
        }
        selected.extend(
            subject_questions
                .into_iter()
                .take(per_subject)
                .enumerate()
                .map(|(idx, question)| IndexedQuestion {
                    idx,
                    question: question.clone(),
                }),
        );
    }
    Ok(selected)
}
