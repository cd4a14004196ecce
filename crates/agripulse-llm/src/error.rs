//! Error types for the generative-language collaborator.

/// Errors returned by a `LanguageModel`.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no API key configured (set llm.api_key or ${0})")]
    MissingApiKey(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("request contains no turns")]
    EmptyRequest,
    #[error("knowledge base error: {0}")]
    KnowledgeBase(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::MissingApiKey("GEMINI_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "no API key configured (set llm.api_key or $GEMINI_API_KEY)"
        );

        let err = LlmError::Api {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): quota exceeded");

        let err = LlmError::EmptyRequest;
        assert_eq!(err.to_string(), "request contains no turns");
    }

    #[test]
    fn test_llm_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: LlmError = json_err.into();
        assert!(matches!(err, LlmError::Decode(_)));
    }
}
