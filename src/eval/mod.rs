//! Benchmark harness comparing the three modes on multiple-choice questions.
//!
//! For each selected question a fresh zero-shot, step-by-step and resolver
//! orchestrator answers the same prompt, a grader scores each answer, and
//! one [`Entry`] is appended to the scoresheet.

pub mod grader;
pub mod question;

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::config::OrchestratorConfig;
use crate::agent::mode::Mode;
use crate::agent::orchestrator::Orchestrator;
use crate::agent::provider::LlmProvider;
use crate::error::{CommandError, ConfigError, Result};

pub use grader::{Grade, Grader};
pub use question::{IndexedQuestion, Question, load_questions, select_questions};

/// One scoresheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Question subject.
    pub subject: String,
    /// Index of the question within its subject.
    pub question_idx: usize,
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
    /// Correct option letter.
    pub answer: String,
    /// Prompt every competitor received.
    pub prompt: String,
    /// Zero-shot grade.
    pub gpt4_correct: bool,
    /// Zero-shot answer.
    pub gpt4_response: String,
    /// Step-by-step grade.
    pub gpt4cot_correct: bool,
    /// Step-by-step answer.
    pub gpt4cot_response: String,
    /// Resolver grade.
    pub smartgpt_correct: bool,
    /// Resolver answer.
    pub smartgpt_response: String,
    /// Set by hand after reviewing the grader.
    pub manually_verified: bool,
}

/// Append-only JSON Lines scoresheet.
#[derive(Debug, Clone)]
pub struct Scoresheet {
    path: PathBuf,
}

impl Scoresheet {
    /// Opens (lazily) the scoresheet at `path`. Existing rows are kept.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where rows are written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Output`] if serialization or the write fails.
    pub fn append(&self, entry: &Entry) -> std::result::Result<(), CommandError> {
        let line = serde_json::to_string(entry)
            .map_err(|e| CommandError::Output(format!("failed to serialize entry: {e}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                CommandError::Output(format!("failed to open {}: {e}", self.path.display()))
            })?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Reads every row back.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or a row is malformed.
    pub fn entries(&self) -> std::result::Result<Vec<Entry>, ConfigError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| ConfigError::Parse {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

/// Which questions to run.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkOptions {
    /// Questions per subject.
    pub per_subject: usize,
    /// Restrict to one subject.
    pub subject: Option<String>,
}

/// Correct-answer counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BenchmarkSummary {
    /// Questions asked.
    pub questions: usize,
    /// Correct zero-shot answers.
    pub zero_shot: usize,
    /// Correct step-by-step answers.
    pub step_by_step: usize,
    /// Correct resolver answers.
    pub resolver: usize,
}

impl BenchmarkSummary {
    fn record(&mut self, entry: &Entry) {
        self.questions += 1;
        self.zero_shot += usize::from(entry.gpt4_correct);
        self.step_by_step += usize::from(entry.gpt4cot_correct);
        self.resolver += usize::from(entry.smartgpt_correct);
    }
}

impl fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "questions:    {}", self.questions)?;
        writeln!(f, "zero_shot:    {}/{}", self.zero_shot, self.questions)?;
        writeln!(f, "step_by_step: {}/{}", self.step_by_step, self.questions)?;
        write!(f, "resolver:     {}/{}", self.resolver, self.questions)
    }
}

/// Runs the benchmark and appends one row per question to `sheet`.
///
/// # Errors
///
/// Returns a configuration error when the question selection is invalid,
/// and propagates agent and output errors.
pub async fn run_benchmark(
    provider: Arc<dyn LlmProvider>,
    config: &OrchestratorConfig,
    questions: &[Question],
    options: &BenchmarkOptions,
    sheet: &Scoresheet,
) -> Result<BenchmarkSummary> {
    if config.num_generators() == 0 {
        return Err(ConfigError::InvalidValue {
            field: "generator_temperatures",
            message: "resolver mode needs at least one generator".to_string(),
        }
        .into());
    }
    let selected = select_questions(questions, options.per_subject, options.subject.as_deref())?;
    let grader = Grader::new(Arc::clone(&provider), config);
    let mut summary = BenchmarkSummary::default();

    for (n, IndexedQuestion { idx, question }) in selected.into_iter().enumerate() {
        info!(subject = %question.subject, idx, "question {}", n + 1);
        let prompt = question.prompt();

        let mut answers = Vec::with_capacity(3);
        for mode in [Mode::ZeroShot, Mode::StepByStep, Mode::Resolver] {
            let mut competitor = Orchestrator::new(Arc::clone(&provider), &config.with_mode(mode));
            answers.push(competitor.response(&prompt).await?.content);
        }
        let [zero_shot, step_by_step, resolver]: [String; 3] = answers
            .try_into()
            .map_err(|_| CommandError::ExecutionFailed("missing competitor answer".to_string()))?;

        let entry = Entry {
            gpt4_correct: grader.grade(&zero_shot, &question.answer).await?.is_correct(),
            gpt4cot_correct: grader.grade(&step_by_step, &question.answer).await?.is_correct(),
            smartgpt_correct: grader.grade(&resolver, &question.answer).await?.is_correct(),
            gpt4_response: zero_shot,
            gpt4cot_response: step_by_step,
            smartgpt_response: resolver,
            subject: question.subject,
            question_idx: idx,
            question: question.question,
            a: question.a,
            b: question.b,
            c: question.c,
            d: question.d,
            answer: question.answer,
            prompt,
            manually_verified: false,
        };

        sheet.append(&entry)?;
        summary.record(&entry);
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse, Role, TokenUsage, assistant_message};
    use crate::error::AgentError;

    use std::time::Duration;

    use async_trait::async_trait;

    /// Answers every competitor with "B" and grades by looking for the
    /// letter in the student's text.
    struct QuizProvider;

    #[async_trait]
    impl LlmProvider for QuizProvider {
        fn name(&self) -> &'static str {
            "quiz"
        }

        async fn chat(&self, request: &ChatRequest) -> std::result::Result<ChatResponse, AgentError> {
            let is_grader = request
                .messages
                .first()
                .is_some_and(|m| m.role == Role::System);
            let last = request
                .messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            let reply = if is_grader {
                if last.starts_with("The correct answer is B.") {
                    "correct"
                } else if last.starts_with("The correct answer is D.") {
                    "hmm, not sure"
                } else {
                    "incorrect"
                }
            } else {
                "The answer is B."
            };
            Ok(ChatResponse {
                message: assistant_message(reply),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig::builder()
            .api_key("k")
            .generator_temperatures(vec![0.7, 0.7])
            .rate_limit_delay(Duration::ZERO)
            .build()
            .unwrap_or_else(|e| panic!("config failed: {e}"))
    }

    fn with_answer(mut q: Question, answer: &str) -> Question {
        q.answer = answer.to_string();
        q
    }

    #[tokio::test]
    async fn test_run_benchmark_writes_rows() {
        let tmp = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let sheet = Scoresheet::new(tmp.path().join("scores.jsonl"));
        let questions = vec![
            with_answer(question::tests::question("math", "m0"), "B"),
            with_answer(question::tests::question("math", "m1"), "A"),
            with_answer(question::tests::question("math", "m2"), "D"),
        ];
        let options = BenchmarkOptions {
            per_subject: 3,
            subject: None,
        };

        let summary = run_benchmark(Arc::new(QuizProvider), &config(), &questions, &options, &sheet)
            .await
            .unwrap_or_else(|e| panic!("benchmark failed: {e}"));

        assert_eq!(
            summary,
            BenchmarkSummary {
                questions: 3,
                zero_shot: 1,
                step_by_step: 1,
                resolver: 1,
            }
        );

        let entries = sheet.entries().unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].question_idx, 0);
        assert_eq!(entries[2].question_idx, 2);
        assert!(entries[0].smartgpt_correct);
        assert!(!entries[1].gpt4_correct);
        // Ambiguous grades are scored as incorrect.
        assert!(!entries[2].gpt4cot_correct);
        assert_eq!(entries[0].prompt, questions[0].prompt());
        assert!(!entries[0].manually_verified);
    }

    #[tokio::test]
    async fn test_run_benchmark_appends_to_existing_sheet() {
        let tmp = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let sheet = Scoresheet::new(tmp.path().join("scores.jsonl"));
        let questions = vec![question::tests::question("math", "m0")];
        let options = BenchmarkOptions {
            per_subject: 1,
            subject: Some("math".to_string()),
        };

        for _ in 0..2 {
            run_benchmark(Arc::new(QuizProvider), &config(), &questions, &options, &sheet)
                .await
                .unwrap_or_else(|e| panic!("benchmark failed: {e}"));
        }

        assert_eq!(sheet.entries().map(|e| e.len()).unwrap_or_default(), 2);
    }

    #[tokio::test]
    async fn test_run_benchmark_rejects_short_subject() {
        let tmp = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let sheet = Scoresheet::new(tmp.path().join("scores.jsonl"));
        let questions = vec![question::tests::question("math", "m0")];
        let options = BenchmarkOptions {
            per_subject: 5,
            subject: None,
        };

        let result =
            run_benchmark(Arc::new(QuizProvider), &config(), &questions, &options, &sheet).await;

        assert!(matches!(
            result,
            Err(crate::error::Error::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(!sheet.path().exists());
    }

    #[test]
    fn test_summary_display() {
        let summary = BenchmarkSummary {
            questions: 4,
            zero_shot: 1,
            step_by_step: 2,
            resolver: 3,
        };
        let text = summary.to_string();
        assert!(text.contains("resolver:     3/4"));
    }
}
