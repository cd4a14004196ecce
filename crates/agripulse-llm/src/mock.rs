//! Scripted `LanguageModel` for tests.
//!
//! Replies are served from a queue in order; once the queue is empty every
//! call gets the default reply. Every request is recorded.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::model::{GenerateRequest, GenerateResponse, LanguageModel};

/// Deterministic, scriptable model.
#[derive(Debug)]
pub struct MockModel {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    default_reply: String,
    requests: Mutex<Vec<GenerateRequest>>,
    translates: bool,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: "mock reply".to_string(),
            requests: Mutex::new(Vec::new()),
            translates: true,
        }
    }

    /// Queue replies served in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    /// Model that reports it cannot translate.
    pub fn without_translation(mut self) -> Self {
        self.translates = false;
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(reply.into()));
        }
    }

    pub fn push_error(&self, error: LlmError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    fn can_translate(&self) -> bool {
        self.translates
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Ok(text)) => Ok(GenerateResponse::new(text)),
            Some(Err(e)) => Err(e),
            None => Ok(GenerateResponse::new(self.default_reply.clone())),
        }
    }
}
