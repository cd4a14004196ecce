use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AgriPulseError, Result};

/// Top-level configuration for AgriPulse.
///
/// Loaded from `~/.agripulse/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgriPulseConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub splash: SplashConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl AgriPulseConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AgriPulseConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AgriPulseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for the knowledge base and persisted session marker.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.agripulse".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Which generative-language collaborator answers questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Hosted Gemini `generateContent` API.
    #[default]
    Gemini,
    /// Offline keyword lookup over a verified-answer JSON file.
    KnowledgeBase,
}

/// Generative-language collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Model identifier sent with every request.
    pub model: String,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// API key. Takes precedence over `api_key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Verified-answer JSON file used by the `knowledge_base` provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_path: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            knowledge_base_path: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Introductory splash screen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplashConfig {
    /// Whether the splash is shown at all.
    pub enabled: bool,
    /// Auto-dismiss delay in milliseconds.
    pub duration_ms: u64,
    /// Session-marker key recording that the splash was shown.
    pub marker_key: String,
    /// Persist the marker to `<data_dir>/session.json` instead of keeping it
    /// for the lifetime of the process.
    pub persist_marker: bool,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 2500,
            marker_key: "agripulse_splash_shown".to_string(),
            persist_marker: false,
        }
    }
}

/// Speech-recognition backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceBackend {
    /// Terminal stand-in: the next typed line is delivered as the transcript.
    #[default]
    Typed,
    /// No speech capability.
    None,
}

/// Voice input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub backend: VoiceBackend,
    /// BCP 47 recognition language.
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            backend: VoiceBackend::default(),
            language: "en-IN".to_string(),
        }
    }
}
