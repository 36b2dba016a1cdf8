//! Chat-completion provider abstraction
//!
//! The workflow talks to the model only through [`LlmClient`]. A request is
//! the message list, an optional set of declared tools, and a sampling
//! temperature; the answer is an [`AssistantResponse`].

use async_trait::async_trait;
use thiserror::Error;

use crate::message::{AssistantResponse, Message};
use crate::tools::ToolSpec;

pub mod mock;
pub mod openai;

pub use mock::ScriptedLlmClient;
pub use openai::HttpLlmClient;

/// LLM errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure or timeout
    #[error("http error: {0}")]
    Http(String),

    /// Non-success HTTP status from the provider
    #[error("provider returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as returned
        body: String,
    },

    /// The provider answered with something unusable
    #[error("response error: {0}")]
    Response(String),

    /// No API key in the config or environment
    #[error("LLM API key not configured")]
    MissingCredentials,
}

/// One chat-completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation sent to the model, in order
    pub messages: Vec<Message>,

    /// Tools the model may call; empty means plain completion
    pub tools: Vec<ToolSpec>,

    /// Sampling temperature
    pub temperature: f32,
}

impl ChatRequest {
    /// Plain completion request with no tools declared
    pub fn new(messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            temperature,
        }
    }

    /// Declare the tools the model may call
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }
}

/// LLM client trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one request and return the model's answer
    async fn chat(&self, request: ChatRequest) -> Result<AssistantResponse, LlmError>;

    /// Plain completion; tool requests are reported as a response error
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        match self.chat(request).await? {
            AssistantResponse::Text(text) => Ok(text),
            AssistantResponse::ToolRequests(calls) => Err(LlmError::Response(format!(
                "expected text, model requested {} tool call(s)",
                calls.len()
            ))),
        }
    }
}
