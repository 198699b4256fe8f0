//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]

use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal, Write as IoWrite};
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::agent::providers::create_provider;
use crate::agent::config::OrchestratorConfig;
use crate::agent::orchestrator::Orchestrator;
use crate::agent::prompt::PromptSet;
use crate::agent::provider::LlmProvider;
use crate::cli::parser::{Cli, Commands};
use crate::cli::repl::{self, BANNER, EditorSource, ReaderSource};
use crate::error::{CommandError, Result};
use crate::eval::{BenchmarkOptions, Scoresheet, load_questions, run_benchmark};
use crate::settings::{Credentials, UserDir, UserSettings};

/// Executes the CLI command.
///
/// # Returns
///
/// Text for stdout on success. The chat session writes its answers as it
/// goes and returns an empty string.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    match cli.command() {
        Commands::Chat => cmd_chat(cli),
        Commands::Ask { prompt } => cmd_ask(cli, &prompt),
        Commands::Settings => cmd_settings(cli),
        Commands::Init => cmd_init(cli),
        Commands::InitPrompts { dir } => cmd_init_prompts(cli, dir.as_deref()),
        Commands::Bench {
            questions,
            output,
            per_subject,
            subject,
        } => cmd_bench(
            cli,
            &questions,
            &output,
            BenchmarkOptions {
                per_subject,
                subject,
            },
        ),
    }
}

// ==================== Shared setup ====================

/// Loads settings from the user directory and applies CLI overrides for
/// this process only.
fn load_settings(cli: &Cli) -> Result<(UserDir, UserSettings)> {
    let dir = UserDir::resolve(cli.home.as_deref())?;
    let mut settings = UserSettings::default_for(&dir)?;

    if let Some(mode) = cli.mode {
        settings.mode = mode;
    }
    if let Some(model) = &cli.model {
        settings.model.clone_from(model);
    }
    if let Some(verbosity) = cli.verbosity {
        settings.verbosity = verbosity;
    }
    if cli.vi {
        settings.vi_mode = true;
    }

    crate::logging::init(settings.verbosity);
    Ok((dir, settings))
}

/// Builds the orchestrator configuration: CLI, then settings file, then
/// environment, then defaults.
fn build_config(cli: &Cli, dir: &UserDir, settings: &UserSettings) -> Result<OrchestratorConfig> {
    let credentials = Credentials::resolve(dir)?;

    let mut builder = settings
        .apply(OrchestratorConfig::builder().api_key(credentials.key()))
        .parallel_generators(cli.parallel);

    let prompt_dir = dir.prompt_dir();
    if prompt_dir.is_dir() {
        builder = builder.prompt_dir(prompt_dir);
    }

    Ok(builder.from_env().build()?)
}

fn build_provider(config: &OrchestratorConfig) -> Result<Arc<dyn LlmProvider>> {
    Ok(create_provider(config)?)
}

/// Creates the tokio runtime used to drive the async agents from sync code.
fn runtime() -> Result<Runtime> {
    Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

// ==================== Commands ====================

fn cmd_chat(cli: &Cli) -> Result<String> {
    let (dir, settings) = load_settings(cli)?;
    let config = build_config(cli, &dir, &settings)?;
    let mut orchestrator = Orchestrator::new(build_provider(&config)?, &config);
    let rt = runtime()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if stdin.is_terminal() {
        let mut source = EditorSource::new(settings.vi_mode, Some(dir.history_path()))?;
        writeln!(stdout, "{BANNER}").map_err(CommandError::from)?;
        repl::run_session(&rt, &mut orchestrator, &mut source, &mut stdout)?;
    } else {
        let mut source = ReaderSource::new(stdin.lock());
        repl::run_session(&rt, &mut orchestrator, &mut source, &mut stdout)?;
    }

    Ok(String::new())
}

fn cmd_ask(cli: &Cli, prompt: &str) -> Result<String> {
    let (dir, settings) = load_settings(cli)?;
    let config = build_config(cli, &dir, &settings)?;
    let mut orchestrator = Orchestrator::new(build_provider(&config)?, &config);

    let answer = runtime()?.block_on(orchestrator.response(prompt))?;
    Ok(format!("{}\n", answer.content))
}

fn cmd_settings(cli: &Cli) -> Result<String> {
    let (dir, settings) = load_settings(cli)?;

    let key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            format!("{} (from OPENAI_API_KEY)", Credentials::new(key.trim()).masked())
        }
        _ => match Credentials::load(&dir.credentials_path()) {
            Ok(credentials) if credentials.is_placeholder() => {
                format!("{} (placeholder, edit the credentials file)", credentials.masked())
            }
            Ok(credentials) => credentials.masked(),
            Err(_) => "missing (run `smartgpt init`)".to_string(),
        },
    };

    let mut output = format!("Directory: {}\n", dir.root().display());
    output.push_str(&settings.to_string());
    let _ = writeln!(output, "\n    API key: {key}");
    Ok(output)
}

fn cmd_init(cli: &Cli) -> Result<String> {
    crate::logging::init(cli.verbosity.unwrap_or_default());
    let dir = UserDir::resolve(cli.home.as_deref())?;

    let settings_path = dir.settings_path();
    let settings_existed = settings_path.exists();
    UserSettings::check(&dir)?;
    let credentials_written = Credentials::ensure_file(&dir)?;

    let mut output = format!("Initialized smartgpt in: {}\n", dir.root().display());
    output.push_str(&format!(
        "  {} {}\n",
        if settings_existed { "kept " } else { "wrote" },
        settings_path.display()
    ));
    output.push_str(&format!(
        "  {} {}\n",
        if credentials_written { "wrote" } else { "kept " },
        dir.credentials_path().display()
    ));
    if credentials_written {
        output.push_str(&format!(
            "\nReplace '{}' in the credentials file with your OpenAI API key.\n",
            crate::settings::PLACEHOLDER_KEY
        ));
    }
    Ok(output)
}

fn cmd_init_prompts(cli: &Cli, dir: Option<&Path>) -> Result<String> {
    crate::logging::init(cli.verbosity.unwrap_or_default());

    let target_dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => UserDir::resolve(cli.home.as_deref())?.prompt_dir(),
    };

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    if written.is_empty() {
        return Ok(format!(
            "All prompt templates already exist in: {}\n",
            target_dir.display()
        ));
    }

    let mut output = format!(
        "Wrote {} prompt template(s) to: {}\n",
        written.len(),
        target_dir.display()
    );
    for path in &written {
        output.push_str(&format!(
            "  {}\n",
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
        ));
    }
    output.push_str("\nEdit these files to customize the agent prompts.\n");
    Ok(output)
}

fn cmd_bench(
    cli: &Cli,
    questions_path: &Path,
    output_path: &Path,
    options: BenchmarkOptions,
) -> Result<String> {
    let (dir, settings) = load_settings(cli)?;
    let questions = load_questions(questions_path)?;
    let config = build_config(cli, &dir, &settings)?;
    let provider = build_provider(&config)?;
    let sheet = Scoresheet::new(output_path);

    let summary =
        runtime()?.block_on(run_benchmark(provider, &config, &questions, &options, &sheet))?;

    Ok(format!("{summary}\n\nScoresheet: {}\n", sheet.path().display()))
}
