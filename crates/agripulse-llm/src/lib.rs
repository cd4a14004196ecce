//! Generative-language collaborators for AgriPulse.
//!
//! Defines the `LanguageModel` contract ("send a conversation, get text
//! back, or get an error") and its implementations: the hosted Gemini API,
//! an offline verified-answer knowledge base, and a scripted mock.

pub mod error;
pub mod gemini;
pub mod knowledge;
pub mod mock;
pub mod model;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use knowledge::{KnowledgeBase, KnowledgeBaseModel, NO_VERIFIED_ANSWER};
pub use mock::MockModel;
pub use model::{GenerateRequest, GenerateResponse, LanguageModel};
