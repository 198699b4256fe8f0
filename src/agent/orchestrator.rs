//! Mode-dispatch orchestrator.
//!
//! Holds the main agent plus whatever the configured mode needs and turns
//! one prompt into one answer:
//!
//! ```text
//! prompt → Orchestrator
//!   ├── ZeroShot   → main.respond(prompt)
//!   ├── StepByStep → main.respond(step_by_step(prompt))
//!   └── Resolver
//!       ├── each generator: seed from main, respond(step_by_step(prompt)) → candidate
//!       ├── researcher: seed from main, respond(critique(prompt, candidates))
//!       ├── resolver: seed from researcher, respond(synthesis(N)) → answer
//!       └── main += [step_by_step(prompt), answer]
//! ```

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info};

use super::config::OrchestratorConfig;
use super::conversation::ConversationAgent;
use super::message::{ChatMessage, user_message};
use super::mode::Mode;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use crate::error::AgentError;

/// The agents and settings a resolver turn needs.
#[derive(Debug)]
pub struct ResolverPanel {
    generators: Vec<ConversationAgent>,
    researcher: ConversationAgent,
    resolver: ConversationAgent,
    suppress_rationale: bool,
    parallel: bool,
}

/// What the orchestrator does with a prompt, with the data each mode needs.
#[derive(Debug)]
pub enum Strategy {
    /// Prompt goes straight to the main agent.
    ZeroShot,
    /// Prompt is wrapped in the step-by-step template first.
    StepByStep,
    /// Generators, researcher and resolver.
    Resolver(ResolverPanel),
}

/// Everything produced by one resolver turn.
#[derive(Debug, Clone)]
pub struct ResolverTurn {
    /// The step-by-step prompt every generator received.
    pub prompt: String,
    /// Generator replies, indexed by generator.
    pub candidates: Vec<String>,
    /// The researcher's critique (not shown to the user).
    pub critique: ChatMessage,
    /// The resolver's final answer.
    pub answer: ChatMessage,
}

/// Coordinates agents according to the configured [`Mode`].
#[derive(Debug)]
pub struct Orchestrator {
    main: ConversationAgent,
    strategy: Strategy,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates the agents for `config.mode` and loads the prompt templates.
    ///
    /// The main and resolver agents share the resolver temperature; the
    /// researcher and each generator use their own.
    pub fn new(provider: Arc<dyn LlmProvider>, config: &OrchestratorConfig) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        let agent = |name: String, temperature: f32| {
            ConversationAgent::new(name, Arc::clone(&provider), &config.model, temperature)
                .with_rate_limit_delay(config.rate_limit_delay)
        };

        let main = agent("main".to_string(), config.resolver_temperature);

        let strategy = match config.mode {
            Mode::ZeroShot => Strategy::ZeroShot,
            Mode::StepByStep => Strategy::StepByStep,
            Mode::Resolver => Strategy::Resolver(ResolverPanel {
                generators: config
                    .generator_temperatures
                    .iter()
                    .enumerate()
                    .map(|(idx, &temp)| agent(format!("generator-{idx}"), temp))
                    .collect(),
                researcher: agent("researcher".to_string(), config.researcher_temperature),
                resolver: agent("resolver".to_string(), config.resolver_temperature),
                suppress_rationale: config.verbosity.suppress_rationale(),
                parallel: config.parallel_generators,
            }),
        };

        Self {
            main,
            strategy,
            prompts,
        }
    }

    /// Replaces the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// The mode this orchestrator dispatches on.
    pub const fn mode(&self) -> Mode {
        match self.strategy {
            Strategy::ZeroShot => Mode::ZeroShot,
            Strategy::StepByStep => Mode::StepByStep,
            Strategy::Resolver(_) => Mode::Resolver,
        }
    }

    /// The main agent, whose history is the session's record.
    pub const fn main(&self) -> &ConversationAgent {
        &self.main
    }

    /// The resolver panel, when in resolver mode.
    pub const fn panel(&self) -> Option<&ResolverPanel> {
        match &self.strategy {
            Strategy::Resolver(panel) => Some(panel),
            Strategy::ZeroShot | Strategy::StepByStep => None,
        }
    }

    /// Turns `prompt` into an answer according to the mode.
    ///
    /// # Errors
    ///
    /// Propagates any agent error unchanged. In resolver mode a failure at
    /// any stage aborts the whole turn and the main history is untouched.
    pub async fn response(&mut self, prompt: &str) -> Result<ChatMessage, AgentError> {
        match &mut self.strategy {
            Strategy::ZeroShot => self.main.respond(prompt).await,
            Strategy::StepByStep => {
                let rendered = self.prompts.step_by_step(prompt);
                self.main.respond(&rendered).await
            }
            Strategy::Resolver(panel) => {
                let turn = panel.run(&mut self.main, &self.prompts, prompt).await?;
                Ok(turn.answer)
            }
        }
    }

    /// Runs a full resolver turn and returns every intermediate result.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] from any agent, or [`AgentError::WrongMode`]
    /// when the orchestrator is not in resolver mode.
    pub async fn resolve(&mut self, prompt: &str) -> Result<ResolverTurn, AgentError> {
        let mode = self.mode();
        match &mut self.strategy {
            Strategy::Resolver(panel) => panel.run(&mut self.main, &self.prompts, prompt).await,
            Strategy::ZeroShot | Strategy::StepByStep => Err(AgentError::WrongMode { mode }),
        }
    }
}

impl ResolverPanel {
    /// The generator agents, in index order.
    pub fn generators(&self) -> &[ConversationAgent] {
        &self.generators
    }

    /// The researcher agent.
    pub const fn researcher(&self) -> &ConversationAgent {
        &self.researcher
    }

    /// The resolver agent.
    pub const fn resolver(&self) -> &ConversationAgent {
        &self.resolver
    }

    async fn run(
        &mut self,
        main: &mut ConversationAgent,
        prompts: &PromptSet,
        prompt: &str,
    ) -> Result<ResolverTurn, AgentError> {
        let step_prompt = prompts.step_by_step(prompt);
        let total = self.generators.len();

        for generator in &mut self.generators {
            generator.seed_from(main);
        }

        let candidates = if self.parallel {
            info!(generators = total, "generating candidates concurrently");
            let replies = try_join_all(
                self.generators
                    .iter_mut()
                    .map(|generator| generator.respond(&step_prompt)),
            )
            .await?;
            replies.into_iter().map(|reply| reply.content).collect()
        } else {
            let mut candidates = Vec::with_capacity(total);
            for (idx, generator) in self.generators.iter_mut().enumerate() {
                info!("generating candidate {}/{total}", idx + 1);
                candidates.push(generator.respond(&step_prompt).await?.content);
            }
            candidates
        };

        for (idx, candidate) in candidates.iter().enumerate() {
            debug!(option = idx + 1, "candidate:\n{candidate}");
        }

        info!("researcher reviewing {total} candidates");
        self.researcher.seed_from(main);
        let critique = self
            .researcher
            .respond(&prompts.researcher(prompt, &candidates))
            .await?;
        debug!("researcher:\n{}", critique.content);

        info!("resolver writing final answer");
        self.resolver.seed_from(&self.researcher);
        let answer = self
            .resolver
            .respond(&prompts.resolver(total, self.suppress_rationale))
            .await?;

        main.push(user_message(&step_prompt));
        main.push(answer.clone());

        Ok(ResolverTurn {
            prompt: step_prompt,
            candidates,
            critique,
            answer,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse, Role, TokenUsage, assistant_message};
    use crate::agent::mode::Verbosity;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    /// Mock provider that labels each reply with its call number and the
    /// request temperature, optionally failing one call.
    struct ScriptedProvider {
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        /// Generators sleep `(1.0 - temperature) * 100ms` so lower
        /// temperatures finish last when run concurrently.
        jitter: bool,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_call: None,
                jitter: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::new()
            }
        }

        fn with_jitter() -> Self {
            Self {
                jitter: true,
                ..Self::new()
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            if self.fail_on_call == Some(call) {
                return Err(AgentError::UnsupportedRequest {
                    message: "context_length_exceeded".to_string(),
                });
            }
            let temperature = request.temperature.unwrap_or_default();
            if self.jitter {
                let millis = ((1.0 - temperature) * 100.0).max(0.0) as u64;
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            Ok(ChatResponse {
                message: assistant_message(&format!("reply {call} @ {temperature:.1}")),
                usage: TokenUsage {
                    prompt_tokens: 1,
                    completion_tokens: 1,
                    total_tokens: 2,
                },
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    fn config(mode: Mode) -> OrchestratorConfig {
        OrchestratorConfig::builder()
            .api_key("test")
            .mode(mode)
            .generator_temperatures(vec![0.7, 0.8, 0.9])
            .researcher_temperature(0.4)
            .resolver_temperature(0.5)
            .rate_limit_delay(Duration::ZERO)
            .build()
            .unwrap_or_else(|e| panic!("config failed: {e}"))
    }

    fn orchestrator(provider: &Arc<ScriptedProvider>, config: &OrchestratorConfig) -> Orchestrator {
        Orchestrator::new(Arc::clone(provider) as Arc<dyn LlmProvider>, config)
            .with_prompts(PromptSet::defaults())
    }

    #[tokio::test]
    async fn test_zero_shot_passes_prompt_through() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut orch = orchestrator(&provider, &config(Mode::ZeroShot));

        let reply = orch
            .response("What is the capital of France?")
            .await
            .unwrap_or_else(|e| panic!("response failed: {e}"));

        assert_eq!(reply.role, Role::Assistant);
        assert!(!reply.content.is_empty());
        let history = orch.main().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], user_message("What is the capital of France?"));
        assert_eq!(history[1], reply);
        assert!(orch.panel().is_none());
    }

    #[tokio::test]
    async fn test_step_by_step_sends_rendered_prompt() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut orch = orchestrator(&provider, &config(Mode::StepByStep));

        let reply = orch
            .response("Is 91 prime?")
            .await
            .unwrap_or_else(|e| panic!("response failed: {e}"));

        assert_eq!(reply.role, Role::Assistant);
        let expected = PromptSet::defaults().step_by_step("Is 91 prime?");
        let history = orch.main().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, expected);
        assert_ne!(history[0].content, "Is 91 prime?");
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_resolver_turn_shape() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut orch = orchestrator(&provider, &config(Mode::Resolver));

        let turn = orch
            .resolve("Which is heavier, a kilo of feathers or a kilo of steel?")
            .await
            .unwrap_or_else(|e| panic!("resolve failed: {e}"));

        // 3 generators + researcher + resolver
        assert_eq!(provider.requests().len(), 5);
        assert_eq!(
            turn.candidates,
            vec!["reply 0 @ 0.7", "reply 1 @ 0.8", "reply 2 @ 0.9"]
        );
        assert_eq!(turn.critique.content, "reply 3 @ 0.4");
        assert_eq!(turn.answer.content, "reply 4 @ 0.5");
        assert_eq!(turn.answer.role, Role::Assistant);

        let history = orch.main().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], user_message(&turn.prompt));
        assert_eq!(history[1], turn.answer);
    }

    #[tokio::test]
    async fn test_resolver_branch_histories() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut orch = orchestrator(&provider, &config(Mode::Resolver));
        let question = "Why is the sky blue?";

        orch.response(question)
            .await
            .unwrap_or_else(|e| panic!("response failed: {e}"));

        let prompts = PromptSet::defaults();
        let step_prompt = prompts.step_by_step(question);
        let requests = provider.requests();

        // Every generator saw exactly the same request, built on the main history.
        for request in &requests[..3] {
            assert_eq!(request.messages, vec![user_message(&step_prompt)]);
        }

        // The researcher starts from main, not from any generator branch.
        let candidates = vec![
            "reply 0 @ 0.7".to_string(),
            "reply 1 @ 0.8".to_string(),
            "reply 2 @ 0.9".to_string(),
        ];
        assert_eq!(
            requests[3].messages,
            vec![user_message(&prompts.researcher(question, &candidates))]
        );

        // The resolver inherits the researcher's critique.
        let resolver_request = &requests[4].messages;
        assert_eq!(resolver_request.len(), 3);
        assert_eq!(resolver_request[1].content, "reply 3 @ 0.4");
        assert_eq!(resolver_request[2].content, prompts.resolver(3, true));

        let panel = orch.panel().unwrap_or_else(|| panic!("expected resolver panel"));
        assert!(panel.generators().iter().all(|g| g.history().len() == 2));
        assert_eq!(panel.researcher().history().len(), 2);
        assert_eq!(panel.resolver().history().len(), 4);
    }

    #[tokio::test]
    async fn test_resolver_second_turn_builds_on_main_only() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut orch = orchestrator(&provider, &config(Mode::Resolver));

        orch.response("first")
            .await
            .unwrap_or_else(|e| panic!("response failed: {e}"));
        let main_after_first = orch.main().history().to_vec();

        orch.response("second")
            .await
            .unwrap_or_else(|e| panic!("response failed: {e}"));

        assert_eq!(orch.main().history().len(), 4);
        assert_eq!(&orch.main().history()[..2], main_after_first.as_slice());

        // Second-turn generators were re-seeded from main: 2 shared + 2 own.
        let requests = provider.requests();
        assert_eq!(requests[5].messages.len(), 3);
        assert_eq!(&requests[5].messages[..2], main_after_first.as_slice());
    }

    #[tokio::test]
    async fn test_rationale_follows_verbosity() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut cfg = config(Mode::Resolver);
        cfg.verbosity = Verbosity::All;
        let mut orch = orchestrator(&provider, &cfg);

        orch.response("q")
            .await
            .unwrap_or_else(|e| panic!("response failed: {e}"));

        let requests = provider.requests();
        let resolver_prompt = &requests[4].messages[2].content;
        assert_eq!(resolver_prompt, &PromptSet::defaults().resolver(3, false));
    }

    #[tokio::test]
    async fn test_generator_failure_aborts_turn() {
        // Call 1 is the second generator.
        let provider = Arc::new(ScriptedProvider::failing_on(1));
        let mut orch = orchestrator(&provider, &config(Mode::Resolver));

        let result = orch.response("q").await;

        assert!(matches!(result, Err(AgentError::UnsupportedRequest { .. })));
        assert!(orch.main().history().is_empty());
        // No researcher or resolver call was made.
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_generator_failure_aborts_turn() {
        let provider = Arc::new(ScriptedProvider::failing_on(1));
        let mut cfg = config(Mode::Resolver);
        cfg.parallel_generators = true;
        let mut orch = orchestrator(&provider, &cfg);

        let result = orch.response("q").await;

        assert!(matches!(result, Err(AgentError::UnsupportedRequest { .. })));
        assert!(orch.main().history().is_empty());
        // Only generator requests went out: each carries just the step prompt.
        let step_prompt = PromptSet::defaults().step_by_step("q");
        let requests = provider.requests();
        assert!((2..=3).contains(&requests.len()));
        for request in &requests {
            assert_eq!(request.messages.len(), 1);
            assert_eq!(request.messages[0].content, step_prompt);
        }
    }

    #[tokio::test]
    async fn test_resolver_failure_leaves_main_untouched() {
        let provider = Arc::new(ScriptedProvider::failing_on(4));
        let mut orch = orchestrator(&provider, &config(Mode::Resolver));

        let result = orch.response("q").await;

        assert!(result.is_err());
        assert!(orch.main().history().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_candidates_keep_generator_order() {
        let provider = Arc::new(ScriptedProvider::with_jitter());
        let mut cfg = config(Mode::Resolver);
        cfg.generator_temperatures = vec![0.1, 0.5, 0.9];
        cfg.parallel_generators = true;
        let mut orch = orchestrator(&provider, &cfg);

        let turn = orch
            .resolve("q")
            .await
            .unwrap_or_else(|e| panic!("resolve failed: {e}"));

        assert_eq!(turn.candidates.len(), 3);
        let temps: Vec<&str> = turn
            .candidates
            .iter()
            .map(|c| c.rsplit(' ').next().unwrap_or_default())
            .collect();
        assert_eq!(temps, vec!["0.1", "0.5", "0.9"]);
        assert_eq!(orch.main().history().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_outside_resolver_mode() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut orch = orchestrator(&provider, &config(Mode::ZeroShot));
        let result = orch.resolve("q").await;
        assert!(matches!(
            result,
            Err(AgentError::WrongMode {
                mode: Mode::ZeroShot
            })
        ));
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_mode_reflects_config() {
        let provider = Arc::new(ScriptedProvider::new());
        for mode in [Mode::ZeroShot, Mode::StepByStep, Mode::Resolver] {
            assert_eq!(orchestrator(&provider, &config(mode)).mode(), mode);
        }
        let orch = orchestrator(&provider, &config(Mode::Resolver));
        let panel = orch.panel().unwrap_or_else(|| panic!("expected panel"));
        assert_eq!(panel.generators().len(), 3);
        assert!((panel.researcher().temperature() - 0.4).abs() < f32::EPSILON);
        assert!((orch.main().temperature() - 0.5).abs() < f32::EPSILON);
    }
}
