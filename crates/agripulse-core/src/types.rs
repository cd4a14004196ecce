use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation turns
// =============================================================================

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation. Never modified after it is appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

// =============================================================================
// PendingQuery
// =============================================================================

/// Text staged in the input field, not yet part of any transcript.
///
/// Cloning yields another handle onto the same text, so the speech and
/// translate adapters can write into the field the controller submits from.
#[derive(Clone, Debug, Default)]
pub struct PendingQuery {
    text: Arc<Mutex<String>>,
}

impl PendingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the staged text.
    pub fn get(&self) -> String {
        self.lock().clone()
    }

    /// Replace the staged text.
    pub fn set(&self, text: impl Into<String>) {
        *self.lock() = text.into();
    }

    /// Clear the staged text, returning what was there.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_blank(&self) -> bool {
        self.lock().trim().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Pending query lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

// =============================================================================
// Notices
// =============================================================================

/// A user-visible message that is not part of the conversation transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// Translate was requested with nothing to translate.
    EmptyTranslation,
    /// The translation call failed; the staged text is unchanged.
    TranslationFailed,
    /// The active collaborator cannot translate.
    TranslationUnsupported,
    /// Speech recognition is not available in this environment.
    SpeechUnavailable,
}

impl Notice {
    /// Fixed user-facing text for this notice.
    pub fn message(&self) -> &'static str {
        match self {
            Notice::EmptyTranslation => "Please enter some text to translate.",
            Notice::TranslationFailed => "Translation failed. Please try again.",
            Notice::TranslationUnsupported => "Translation is not available in offline mode.",
            Notice::SpeechUnavailable => "Speech recognition is not supported here.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives notices destined for the user.
pub trait NoticeSink: Send + Sync {
    fn show(&self, notice: Notice);
}

/// Notice sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn show(&self, notice: Notice) {
        tracing::info!(notice = ?notice, "{}", notice.message());
    }
}

/// Notice sink that keeps every notice it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNoticeSink {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl NoticeSink for RecordingNoticeSink {
    fn show(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
