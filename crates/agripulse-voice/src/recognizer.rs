//! Speech-to-text collaborators.

use agripulse_core::{AgriPulseError, Result};

/// Terminal event reported by a recognizer after `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A final transcript.
    Transcript(String),
    /// Recognition failed with the given code (e.g. "no-speech").
    Error(String),
    /// The recognizer stopped, with or without a result.
    Ended,
}

/// A speech-recognition capability.
///
/// `begin` and `stop` only start and stop capture; results are delivered
/// later as `RecognitionEvent`s by whoever drives the adapter.
pub trait SpeechRecognizer: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    /// Whether recognition is supported in this environment.
    fn is_available(&self) -> bool;

    fn begin(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;
}

/// Recognizer for environments without speech support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn begin(&self) -> Result<()> {
        Err(AgriPulseError::Speech(
            "speech recognition is not available".to_string(),
        ))
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }
}

/// Recognizer for terminals: the next line the user types while listening
/// is taken as the spoken transcript.
#[derive(Debug, Clone)]
pub struct TypedRecognizer {
    language: String,
}

impl Default for TypedRecognizer {
    fn default() -> Self {
        Self::new("en-IN")
    }
}

impl TypedRecognizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Turn a typed line into the event a microphone would have produced.
    /// An empty line means nothing was heard.
    pub fn event_for_line(line: &str) -> RecognitionEvent {
        let line = line.trim();
        if line.is_empty() {
            RecognitionEvent::Error("no-speech".to_string())
        } else {
            RecognitionEvent::Transcript(line.to_string())
        }
    }
}

impl SpeechRecognizer for TypedRecognizer {
    fn name(&self) -> &str {
        "typed"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn begin(&self) -> Result<()> {
        tracing::debug!(language = %self.language, "Typed recognizer listening");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        tracing::debug!("Typed recognizer stopped");
        Ok(())
    }
}
