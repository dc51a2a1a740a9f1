//! Provider-neutral chat completion types
//!
//! These mirror the parts of a tool-calling chat API the extractor relies
//! on. Providers translate them to and from their own wire format.

use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A function the model may call, described by a JSON schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name the model must echo back
    pub name: String,
    /// What the function is for
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: serde_json::Value,
}

/// A request for one completion
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatRequest {
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Tools offered to the model
    pub tools: Vec<ToolDefinition>,
}

/// A tool invocation returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the invoked function
    pub name: String,
    /// Raw JSON arguments, exactly as the model produced them
    pub arguments: String,
}

/// One candidate completion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Choice {
    /// Plain-text reply, if any
    pub content: Option<String>,
    /// Tool invocations, possibly empty
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped (`stop`, `tool_calls`, `length`, ...)
    pub finish_reason: Option<String>,
}

/// The model's answer to a [`ChatRequest`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Returned choices; the extractor expects exactly one
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// A single-choice response carrying one tool call
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                content: None,
                tool_calls: vec![ToolCall {
                    name: name.into(),
                    arguments: arguments.into(),
                }],
                finish_reason: Some("tool_calls".to_string()),
            }],
        }
    }

    /// A single-choice plain-text response that finished normally
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                content: Some(content.into()),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }
}
