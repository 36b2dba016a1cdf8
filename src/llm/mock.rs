//! Scripted LLM client for tests and demos

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ChatRequest, LlmClient, LlmError};
use crate::message::AssistantResponse;

enum Step {
    Respond(AssistantResponse),
    Fail(String),
}

/// Replays queued responses in order and records every request it receives
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Step>>,
    fallback: Option<AssistantResponse>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlmClient {
    /// Answer with `responses` in order, then fail
    pub fn new(responses: Vec<AssistantResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Step::Respond).collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same response
    pub fn always(response: AssistantResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a single plain-text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![AssistantResponse::Text(text.into())])
    }

    /// Queue a provider failure after the responses already scripted
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.script.lock().push_back(Step::Fail(reason.into()));
        self
    }

    /// Queue another response
    pub fn then_respond(self, response: AssistantResponse) -> Self {
        self.script.lock().push_back(Step::Respond(response));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<AssistantResponse, LlmError> {
        self.requests.lock().push(request);

        let next = self.script.lock().pop_front();
        match next {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(reason)) => Err(LlmError::Http(reason)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LlmError::Response("scripted client has no responses left".to_string())),
        }
    }
}
