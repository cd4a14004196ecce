//! Offline verified-answer lookup.
//!
//! A knowledge base is a JSON object mapping keywords to answers. A question
//! is answered with the entry whose keyword is the longest one contained in
//! the lowercased question.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::model::{GenerateRequest, GenerateResponse, LanguageModel};

/// Reply when no keyword matches.
pub const NO_VERIFIED_ANSWER: &str = "Sorry, I don't have verified information on this.";

const BUILTIN_KNOWLEDGE: &str = include_str!("../data/knowledge.json");

/// Keyword -> answer table. Keywords are stored lowercased.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: BTreeMap<String, String>,
}

impl KnowledgeBase {
    /// Parse a JSON object of `"keyword": "answer"` pairs.
    ///
    /// Blank keywords are dropped since they would match every question.
    pub fn from_json_str(json: &str) -> Result<Self, LlmError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)
            .map_err(|e| LlmError::KnowledgeBase(format!("invalid knowledge file: {}", e)))?;
        let entries = raw
            .into_iter()
            .filter_map(|(k, v)| {
                let key = k.trim().to_lowercase();
                (!key.is_empty()).then_some((key, v))
            })
            .collect();
        Ok(Self { entries })
    }

    /// Load a knowledge base from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LlmError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LlmError::KnowledgeBase(format!("cannot read {}: {}", path.display(), e))
        })?;
        let kb = Self::from_json_str(&content)?;
        tracing::info!(entries = kb.len(), path = %path.display(), "Knowledge base loaded");
        Ok(kb)
    }

    /// The knowledge base bundled with the binary.
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_KNOWLEDGE).unwrap_or_default()
    }

    /// Answer for the longest keyword contained in `question`.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        let question = question.to_lowercase();
        self.entries
            .iter()
            .filter(|(key, _)| question.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, answer)| answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `LanguageModel` that answers the latest user turn from a knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseModel {
    knowledge: KnowledgeBase,
}

impl KnowledgeBaseModel {
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl LanguageModel for KnowledgeBaseModel {
    fn name(&self) -> &str {
        "knowledge-base"
    }

    fn can_translate(&self) -> bool {
        false
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let question = request.last_user_text().ok_or(LlmError::EmptyRequest)?;
        let answer = match self.knowledge.lookup(question) {
            Some(answer) => answer,
            None => {
                tracing::debug!(question_len = question.len(), "No verified answer");
                NO_VERIFIED_ANSWER
            }
        };
        Ok(GenerateResponse::new(answer))
    }
}
