//! The `LanguageModel` collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agripulse_core::Turn;

use crate::error::LlmError;

/// One call to a generative-language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier.
    pub model: String,
    /// Ordered conversation, oldest first. The last turn is the new message.
    pub turns: Vec<Turn>,
    /// Optional system instruction.
    pub system_instruction: Option<String>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            model: model.into(),
            turns,
            system_instruction: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Text of the most recent user turn, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == agripulse_core::Role::User)
            .map(|t| t.text.as_str())
    }
}

/// A model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
}

impl GenerateResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A generative-language collaborator: send a conversation, get text back.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    /// Whether free-form instructions such as translation are honoured.
    fn can_translate(&self) -> bool {
        true
    }

    /// Generate a reply for the request.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = GenerateRequest::new("gemini-1.5-flash", vec![Turn::user("hi")])
            .with_system_instruction("be brief");
        assert_eq!(req.model, "gemini-1.5-flash");
        assert_eq!(req.turns.len(), 1);
        assert_eq!(req.system_instruction.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_last_user_text_skips_assistant_turns() {
        let req = GenerateRequest::new(
            "m",
            vec![
                Turn::assistant("greeting"),
                Turn::user("first"),
                Turn::assistant("answer"),
                Turn::user("second"),
                Turn::assistant("trailing"),
            ],
        );
        assert_eq!(req.last_user_text(), Some("second"));
    }

    #[test]
    fn test_last_user_text_none() {
        let req = GenerateRequest::new("m", vec![Turn::assistant("only me")]);
        assert_eq!(req.last_user_text(), None);
    }
}
