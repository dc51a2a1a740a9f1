//! Tally LLM Provider Layer
//!
//! Pluggable LLM provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `tally-domain`.
//! Every provider speaks the provider-neutral chat types in
//! `tally_domain::completion`, so the extractor never sees a wire format.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions with tool calling
//!
//! # Examples
//!
//! ```
//! use tally_llm::MockProvider;
//! use tally_domain::completion::{ChatRequest, ChatResponse};
//! use tally_domain::traits::LlmProvider;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockProvider::new(ChatResponse::text("Hello from LLM!"));
//! let result = provider.complete(ChatRequest::default()).await.unwrap();
//! assert_eq!(result.choices[0].content.as_deref(), Some("Hello from LLM!"));
//! # }
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tally_domain::completion::{ChatRequest, ChatResponse, Role};
use tally_domain::traits::LlmProvider;
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The request did not complete in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// API key rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Respond(ChatResponse),
    Fail(String),
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Responses can be keyed by the text of the last user message.
///
/// # Examples
///
/// ```
/// use tally_llm::MockProvider;
/// use tally_domain::completion::{ChatMessage, ChatRequest, ChatResponse};
/// use tally_domain::traits::LlmProvider;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("hello", ChatResponse::text("world"));
///
/// let request = ChatRequest {
///     messages: vec![ChatMessage::user("hello")],
///     tools: Vec::new(),
/// };
/// let response = provider.complete(request).await.unwrap();
/// assert_eq!(response.choices[0].content.as_deref(), Some("world"));
/// assert_eq!(provider.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: MockReply,
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: ChatResponse) -> Self {
        Self {
            default_reply: MockReply::Respond(response),
            replies: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// A provider that answers every request with one tool call
    pub fn with_tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::new(ChatResponse::tool_call(name, arguments))
    }

    /// A provider that fails every request
    pub fn failing(message: impl Into<String>) -> Self {
        let mut provider = Self::default();
        provider.default_reply = MockReply::Fail(message.into());
        provider
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given user message
    pub fn add_response(&mut self, user_text: impl Into<String>, response: ChatResponse) {
        lock(&self.replies).insert(user_text.into(), MockReply::Respond(response));
    }

    /// Configure to return an error for a specific user message
    pub fn add_error(&mut self, user_text: impl Into<String>) {
        lock(&self.replies).insert(user_text.into(), MockReply::Fail("Mock error".to_string()));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        lock(&self.requests).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(ChatResponse::text("Default mock response"))
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, Self::Error> {
        let user_text = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        lock(&self.requests).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.replies)
            .get(&user_text)
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            MockReply::Respond(response) => Ok(response),
            MockReply::Fail(message) => Err(LlmError::Other(message)),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Lock a mutex, recovering the data if a panicking test poisoned it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
