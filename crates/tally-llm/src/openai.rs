//! OpenAI-compatible Provider Implementation
//!
//! Talks to any server exposing the `/chat/completions` endpoint with
//! function calling: OpenAI itself, Azure-style gateways, or local servers
//! such as vLLM and Ollama's OpenAI shim.
//!
//! # Features
//!
//! - Tool definitions sent as `function` tools with `tool_choice: "auto"`
//! - Configurable base URL, model and per-request timeout
//! - Optional retry with exponential backoff for transient failures
//!
//! # Examples
//!
//! ```no_run
//! use tally_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...", "gpt-4o-mini")
//!     .unwrap()
//!     .with_base_url("http://localhost:8000/v1");
//! ```

use crate::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tally_domain::completion::{ChatMessage, ChatRequest, ChatResponse, Choice, ToolCall};
use tally_domain::traits::LlmProvider;
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for one request (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of extra attempts after a transient failure
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Provider for OpenAI-compatible chat completion APIs
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    function: WireCalledFunction,
}

#[derive(Deserialize)]
struct WireCalledFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<WireResponse> for ChatResponse {
    fn from(wire: WireResponse) -> Self {
        let choices = wire
            .choices
            .into_iter()
            .map(|choice| Choice {
                content: choice.message.content,
                tool_calls: choice
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolCall {
                        name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect(),
                finish_reason: choice.finish_reason,
            })
            .collect();
        ChatResponse { choices }
    }
}

impl OpenAiProvider {
    /// Create a provider for `model`, authenticated with `api_key`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Other`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: build_client(timeout)?,
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Point the provider at another OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Change the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Set the number of extra attempts after a transient failure
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn send_once(&self, body: &WireRequest<'_>) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Authentication(error_text),
                404 => LlmError::ModelNotAvailable(self.model.clone()),
                429 => LlmError::RateLimitExceeded,
                _ => LlmError::Communication(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let wire: WireResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        Ok(wire.into())
    }

    fn map_transport(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Communication(format!("Request failed: {}", error))
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))
}

fn is_transient(error: &LlmError) -> bool {
    matches!(
        error,
        LlmError::Communication(_) | LlmError::Timeout(_) | LlmError::RateLimitExceeded
    )
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, Self::Error> {
        let tools: Vec<WireTool<'_>> = request
            .tools
            .iter()
            .map(|tool| WireTool {
                kind: "function",
                function: WireFunction {
                    name: &tool.name,
                    description: &tool.description,
                    parameters: &tool.parameters,
                },
            })
            .collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");

        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            tools,
            tool_choice,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(response) => {
                    debug!(model = %self.model, choices = response.choices.len(), "completion received");
                    return Ok(response);
                }
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    attempt += 1;
                    // Exponential backoff: 1s, 2s, 4s, etc.
                    let delay = Duration::from_secs(2u64.pow(attempt - 1));
                    warn!(error = %e, attempt, "completion failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tally_domain::completion::ToolDefinition;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new("test-key", "test-model")
            .unwrap()
            .with_base_url(base_url)
    }

    fn request_with_tool() -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::system("extract"), ChatMessage::user("lunch 12")],
            tools: vec![ToolDefinition {
                name: "parse_financial_data".to_string(),
                description: "Record data".to_string(),
                parameters: json!({"type": "object"}),
            }],
        }
    }

    #[test]
    fn test_provider_defaults() {
        let provider = OpenAiProvider::new("key", "gpt-4o-mini").unwrap();
        assert_eq!(provider.model_name(), "gpt-4o-mini");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(provider.max_retries, 0);

        let trimmed = provider.with_base_url("http://localhost:8000/v1/");
        assert_eq!(trimmed.base_url, "http://localhost:8000/v1");
    }

    #[tokio::test]
    async fn test_tool_call_response() {
        let router = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer test-key");
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["tool_choice"], "auto");
                assert_eq!(body["tools"][0]["type"], "function");
                assert_eq!(body["tools"][0]["function"]["name"], "parse_financial_data");
                assert_eq!(body["messages"][1]["role"], "user");
                Json(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {
                                    "name": "parse_financial_data",
                                    "arguments": "{\"transactions\":[]}"
                                }
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }]
                }))
            }),
        );
        let base = serve(router).await;

        let response = provider(&base).complete(request_with_tool()).await.unwrap();
        assert_eq!(
            response,
            ChatResponse::tool_call("parse_financial_data", "{\"transactions\":[]}")
        );
    }

    #[tokio::test]
    async fn test_plain_text_response_omits_tools() {
        let router = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert!(body.get("tools").is_none());
                assert!(body.get("tool_choice").is_none());
                Json(json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": "Hi there"},
                        "finish_reason": "stop"
                    }]
                }))
            }),
        );
        let base = serve(router).await;

        let request = ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            tools: Vec::new(),
        };
        let response = provider(&base).complete(request).await.unwrap();
        assert_eq!(response, ChatResponse::text("Hi there"));
    }

    #[tokio::test]
    async fn test_http_errors_are_classified() {
        let router = Router::new()
            .route(
                "/auth/chat/completions",
                post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
            )
            .route(
                "/limit/chat/completions",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route(
                "/broken/chat/completions",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/garbage/chat/completions", post(|| async { "not json" }));
        let base = serve(router).await;

        let auth = provider(&format!("{}/auth", base)).complete(request_with_tool()).await;
        assert!(matches!(auth, Err(LlmError::Authentication(_))));

        let limit = provider(&format!("{}/limit", base)).complete(request_with_tool()).await;
        assert!(matches!(limit, Err(LlmError::RateLimitExceeded)));

        let broken = provider(&format!("{}/broken", base)).complete(request_with_tool()).await;
        assert!(matches!(broken, Err(LlmError::Communication(msg)) if msg.contains("500")));

        let garbage = provider(&format!("{}/garbage", base)).complete(request_with_tool()).await;
        assert!(matches!(garbage, Err(LlmError::InvalidResponse(_))));

        let missing = provider(&format!("{}/nowhere", base)).complete(request_with_tool()).await;
        assert!(matches!(missing, Err(LlmError::ModelNotAvailable(model)) if model == "test-model"));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"choices": []}))
            }),
        );
        let base = serve(router).await;

        let result = provider(&base)
            .with_timeout(Duration::from_millis(100))
            .unwrap()
            .complete(request_with_tool())
            .await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = provider(&format!("http://{}", addr))
            .complete(request_with_tool())
            .await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
