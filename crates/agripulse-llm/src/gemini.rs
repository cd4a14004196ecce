//! Gemini `generateContent` client.
//!
//! Non-streaming: one POST per request, reply text is the concatenation of
//! the first candidate's text parts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agripulse_core::config::LlmConfig;
use agripulse_core::{Role, Turn};

use crate::error::LlmError;
use crate::model::{GenerateRequest, GenerateResponse, LanguageModel};

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_body(request: &GenerateRequest) -> GeminiRequest {
    let contents = request
        .turns
        .iter()
        .map(|t: &Turn| GeminiContent {
            role: Some(wire_role(t.role).to_string()),
            parts: vec![GeminiPart {
                text: t.text.clone(),
            }],
        })
        .collect();

    let system_instruction = request
        .system_instruction
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: s.clone() }],
        });

    GeminiRequest {
        contents,
        system_instruction,
    }
}

/// Extract reply text from a `generateContent` response body.
///
/// A response without candidates (e.g. a blocked prompt) yields empty text.
fn parse_reply(body: &str) -> Result<String, LlmError> {
    let response: GeminiResponse = serde_json::from_str(body)?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Ok(text)
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from configuration, resolving the API key.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(config.base_url.clone(), api_key))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        if request.turns.is_empty() {
            return Err(LlmError::EmptyRequest);
        }

        let body = build_body(&request);
        tracing::debug!(
            model = %request.model,
            turns = request.turns.len(),
            has_system_instruction = body.system_instruction.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply = parse_reply(&text)?;
        tracing::debug!(reply_len = reply.len(), "generateContent reply received");
        Ok(GenerateResponse::new(reply))
    }
}
