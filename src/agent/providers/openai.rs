//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Supports any `OpenAI`-compatible API (`OpenAI`, Azure, local proxies)
//! via the base URL override in [`OrchestratorConfig`].

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::agent::config::OrchestratorConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// `OpenAI`-compatible LLM provider.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Creates a new provider from orchestrator configuration.
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry()),
        }
    }

    /// Converts our message type to the `OpenAI` SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }),
            Role::Assistant => {
                #[allow(deprecated)]
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                        msg.content.clone(),
                    )),
                    name: None,
                    tool_calls: None,
                    refusal: None,
                    audio: None,
                    function_call: None,
                })
            }
        }
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.temperature,
            ..Default::default()
        }
    }

    /// Maps an SDK error onto the agent error taxonomy.
    fn classify_error(err: OpenAIError) -> AgentError {
        match err {
            OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
            OpenAIError::Reqwest(e) => AgentError::ApiRequest {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            other => AgentError::ApiRequest {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

/// A backoff policy that gives up on the first failure.
///
/// Rate limits must reach [`ConversationAgent`](crate::agent::ConversationAgent)
/// immediately so its fixed-delay retry applies instead of the SDK's
/// growing one.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Classifies an endpoint error body by its `type` field and message.
///
/// Rate limits come back as `type: "requests"` or `"tokens"`; rejected
/// payloads as `invalid_request_error`. Quota exhaustion is not transient
/// and stays a plain request failure.
pub(crate) fn classify_api_error(kind: Option<&str>, message: &str) -> AgentError {
    match kind {
        Some("invalid_request_error") => AgentError::UnsupportedRequest {
            message: message.to_string(),
        },
        Some("requests" | "tokens") => AgentError::RateLimited {
            message: message.to_string(),
        },
        Some("insufficient_quota") => AgentError::ApiRequest {
            message: message.to_string(),
            status: Some(429),
        },
        _ if message.to_lowercase().contains("rate limit") => AgentError::RateLimited {
            message: message.to_string(),
        },
        _ => AgentError::ApiRequest {
            message: message.to_string(),
            status: None,
        },
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let openai_request = Self::build_request(request);

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(Self::classify_error)?;

        let choice = response.choices.first().ok_or(AgentError::EmptyResponse)?;

        let content = choice.message.content.clone().unwrap_or_default();

        let finish_reason = choice
            .finish_reason
            .as_ref()
            .map(|fr| format!("{fr:?}").to_lowercase());

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(ChatResponse {
            message: ChatMessage {
                role: Role::Assistant,
                content,
            },
            usage,
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::agent::message;

    const RATE_LIMIT_BODY: &str = r#"{"error":{"message":"Rate limit reached for requests","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#;

    /// Drains one HTTP request (headers plus `Content-Length` body).
    fn read_request(stream: &mut TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut body = vec![0; content_length];
        let _ = reader.read_exact(&mut body);
    }

    /// Local endpoint that answers every request with a 429.
    ///
    /// Returns the base URL and the number of requests served.
    fn rate_limited_endpoint() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap_or_else(|_| unreachable!());
        let addr = listener.local_addr().unwrap_or_else(|_| unreachable!());
        let hits = Arc::new(AtomicUsize::new(0));
        let served = Arc::clone(&hits);

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                read_request(&mut stream);
                served.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 429 Too Many Requests\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{RATE_LIMIT_BODY}",
                    RATE_LIMIT_BODY.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}/v1"), hits)
    }

    #[tokio::test]
    async fn test_rate_limit_is_returned_on_first_429() {
        let (base_url, hits) = rate_limited_endpoint();
        let config = OrchestratorConfig::builder()
            .api_key("sk-test")
            .base_url(base_url)
            .build()
            .unwrap_or_else(|_| unreachable!());
        let provider = OpenAiProvider::new(&config);
        let request = ChatRequest {
            model: "gpt-4".to_string(),
            messages: vec![message::user_message("hello")],
            temperature: Some(0.5),
        };

        let result =
            tokio::time::timeout(Duration::from_secs(5), provider.chat(&request)).await;

        assert!(
            matches!(result, Ok(Err(AgentError::RateLimited { .. }))),
            "{result:?}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_convert_system_message() {
        let msg = message::system_message("test");
        let converted = OpenAiProvider::convert_message(&msg);
        assert!(matches!(converted, ChatCompletionRequestMessage::System(_)));
    }

    #[test]
    fn test_convert_user_message() {
        let msg = message::user_message("hello");
        let converted = OpenAiProvider::convert_message(&msg);
        assert!(matches!(converted, ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_convert_assistant_message() {
        let msg = message::assistant_message("hi there");
        let converted = OpenAiProvider::convert_message(&msg);
        assert!(matches!(
            converted,
            ChatCompletionRequestMessage::Assistant(ref a) if a.content.is_some()
        ));
    }

    #[test]
    fn test_build_request_preserves_history_order() {
        let request = ChatRequest {
            model: "gpt-4".to_string(),
            messages: vec![
                message::system_message("rules"),
                message::user_message("first"),
                message::assistant_message("reply"),
                message::user_message("second"),
            ],
            temperature: Some(0.7),
        };
        let built = OpenAiProvider::build_request(&request);
        assert_eq!(built.model, "gpt-4");
        assert_eq!(built.messages.len(), 4);
        assert!(matches!(
            built.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            built.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert_eq!(built.temperature, Some(0.7));
    }

    #[test]
    fn test_classify_invalid_request() {
        let err = classify_api_error(
            Some("invalid_request_error"),
            "This model's maximum context length is 8192 tokens",
        );
        assert!(matches!(err, AgentError::UnsupportedRequest { .. }));
    }

    #[test]
    fn test_classify_rate_limit_by_type() {
        let err = classify_api_error(Some("requests"), "Too many requests");
        assert!(matches!(err, AgentError::RateLimited { .. }));
        let err = classify_api_error(Some("tokens"), "Too many tokens");
        assert!(matches!(err, AgentError::RateLimited { .. }));
    }

    #[test]
    fn test_classify_rate_limit_by_message() {
        let err = classify_api_error(None, "Rate limit reached for gpt-4");
        assert!(matches!(err, AgentError::RateLimited { .. }));
    }

    #[test]
    fn test_classify_quota_is_not_transient() {
        let err = classify_api_error(Some("insufficient_quota"), "You exceeded your quota");
        assert!(matches!(
            err,
            AgentError::ApiRequest {
                status: Some(429),
                ..
            }
        ));
    }

    #[test]
    fn test_classify_other() {
        let err = classify_api_error(Some("server_error"), "The server had an error");
        assert!(matches!(err, AgentError::ApiRequest { status: None, .. }));
    }
}
