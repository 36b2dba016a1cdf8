//! Conversation log entries exchanged with the LLM provider
//!
//! Every planning run carries an append-only list of [`Message`]s. Assistant
//! entries may carry pending [`ToolCall`]s; tool entries answer one of those
//! calls by id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
    /// Result of a tool call
    Tool,
}

impl MessageRole {
    /// Wire name used by OpenAI-compatible chat APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// A model-issued request to call a named lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back on the tool result
    pub id: String,

    /// Registered tool name
    pub name: String,

    /// Arguments as decoded JSON
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call with a generated id
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("call-{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }
}

/// What the model answered: plain text or a batch of tool requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssistantResponse {
    /// Final text answer
    Text(String),
    /// One or more tool invocations
    ToolRequests(Vec<ToolCall>),
}

impl AssistantResponse {
    /// Pending tool requests, empty for plain text
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            AssistantResponse::Text(_) => &[],
            AssistantResponse::ToolRequests(calls) => calls,
        }
    }
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique entry id
    pub id: uuid::Uuid,
    /// Who produced the entry
    pub role: MessageRole,
    /// Entry text
    pub content: String,

    /// Pending invocations; only ever set on assistant entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Id of the call a tool entry answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Creation time
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Message {
    /// Create a new text message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// System entry
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// User entry
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Assistant entry with no tool calls
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Assistant entry carrying pending tool invocations
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut message = Self::assistant(content);
        message.tool_calls = tool_calls;
        message
    }

    /// Tool entry answering `call`
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        let mut message = Self::new(MessageRole::Tool, content);
        message.tool_call_id = Some(call.id.clone());
        message
    }

    /// Build the assistant entry recording a model response
    pub fn from_response(response: AssistantResponse) -> Self {
        match response {
            AssistantResponse::Text(text) => Self::assistant(text),
            AssistantResponse::ToolRequests(calls) => Self::assistant_with_tools("", calls),
        }
    }

    /// View an assistant entry as the response that produced it
    pub fn response(&self) -> Option<AssistantResponse> {
        if self.role != MessageRole::Assistant {
            return None;
        }
        if self.tool_calls.is_empty() {
            Some(AssistantResponse::Text(self.content.clone()))
        } else {
            Some(AssistantResponse::ToolRequests(self.tool_calls.clone()))
        }
    }

    /// True for assistant entries
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// Assistant entry carrying tool calls
    pub fn has_pending_tools(&self) -> bool {
        self.is_assistant() && !self.tool_calls.is_empty()
    }
}

/// Find the most recent assistant entry in a log
pub fn latest_assistant(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.is_assistant())
}
