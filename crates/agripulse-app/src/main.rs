//! AgriPulse application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the language model (Gemini, or the offline knowledge base)
//! 4. Wire the chat controller, speech adapter and splash gate
//! 5. Run the interactive terminal loop

mod cli;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use agripulse_chat::{ChatController, SplashGate};
use agripulse_core::config::{LlmConfig, LlmProvider, VoiceBackend};
use agripulse_core::{
    AgriPulseConfig, FileSessionStore, MemorySessionStore, NoticeSink, SessionStore,
};
use agripulse_llm::{GeminiClient, KnowledgeBase, KnowledgeBaseModel, LanguageModel, LlmError};
use agripulse_voice::{SpeechAdapter, SpeechRecognizer, TypedRecognizer, UnavailableRecognizer};

use cli::{expand_home, CliArgs};
use repl::{ConsoleNoticeSink, Repl};

/// Build the configured language model.
///
/// A Gemini provider without an API key falls back to the offline knowledge
/// base so the client stays usable.
fn build_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    match config.provider {
        LlmProvider::Gemini => match GeminiClient::from_config(config) {
            Ok(client) => {
                tracing::info!(model = %config.model, "Using Gemini");
                Ok(Arc::new(client))
            }
            Err(LlmError::MissingApiKey(var)) => {
                tracing::warn!(
                    env = %var,
                    "No Gemini API key configured, falling back to the offline knowledge base"
                );
                knowledge_base_model(config)
            }
            Err(e) => Err(e),
        },
        LlmProvider::KnowledgeBase => knowledge_base_model(config),
    }
}

fn knowledge_base_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    let kb = match config.knowledge_base_path {
        Some(ref path) => KnowledgeBase::load(&expand_home(path))?,
        None => KnowledgeBase::builtin(),
    };
    tracing::info!(entries = kb.len(), "Using offline knowledge base");
    Ok(Arc::new(KnowledgeBaseModel::new(kb)))
}

fn build_recognizer(backend: &VoiceBackend, language: &str) -> Arc<dyn SpeechRecognizer> {
    match backend {
        VoiceBackend::Typed => Arc::new(TypedRecognizer::new(language)),
        VoiceBackend::None => Arc::new(UnavailableRecognizer),
    }
}

fn build_session_store(config: &AgriPulseConfig) -> Arc<dyn SessionStore> {
    if config.splash.persist_marker {
        let path = expand_home(&config.general.data_dir).join("session.json");
        tracing::debug!(path = %path.display(), "Session marker persisted to file");
        Arc::new(FileSessionStore::new(path))
    } else {
        Arc::new(MemorySessionStore::new())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = AgriPulseConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting AgriPulse v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Collaborators.
    let model = build_model(&config.llm)?;
    let notices: Arc<dyn NoticeSink> = Arc::new(ConsoleNoticeSink);
    let recognizer = build_recognizer(&config.voice.backend, &config.voice.language);

    // Chat.
    let controller = ChatController::new(model, config.llm.model.clone(), Arc::clone(&notices));
    let speech = Arc::new(SpeechAdapter::new(
        recognizer,
        controller.pending_query(),
        notices,
    ));

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // Splash.
    if config.splash.enabled && !args.no_splash {
        let gate = SplashGate::new(build_session_store(&config), config.splash.marker_key.clone());
        repl::splash(&gate, Duration::from_millis(config.splash.duration_ms), &mut input).await;
    }

    Repl::new(controller, speech).run(&mut input).await?;

    Ok(())
}
