//! Speech adapter bridging a recognizer into the staged query.
//!
//! `toggle_listening` starts or stops capture. Terminal recognizer events are
//! fed back through `handle_event`; a transcript replaces the staged query,
//! anything else leaves it alone.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use agripulse_core::{AgriPulseError, Notice, NoticeSink, PendingQuery};

use crate::recognizer::{RecognitionEvent, SpeechRecognizer};
use crate::state::{SpeechState, StateMachine};

/// One stretch of listening, from `begin` to its terminal event.
#[derive(Debug, Clone)]
pub struct ListeningSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl ListeningSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Elapsed listening time in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds() as f32 / 1000.0
    }
}

pub struct SpeechAdapter {
    recognizer: Arc<dyn SpeechRecognizer>,
    state_machine: StateMachine,
    session: Mutex<Option<ListeningSession>>,
    pending: PendingQuery,
    notices: Arc<dyn NoticeSink>,
}

impl std::fmt::Debug for SpeechAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechAdapter")
            .field("recognizer", &self.recognizer.name())
            .field("state_machine", &self.state_machine)
            .field("session", &self.session)
            .finish()
    }
}

impl SpeechAdapter {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        pending: PendingQuery,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            recognizer,
            state_machine: StateMachine::new(),
            session: Mutex::new(None),
            pending,
            notices,
        }
    }

    pub fn current_state(&self) -> SpeechState {
        self.state_machine.current()
    }

    pub fn is_listening(&self) -> bool {
        self.current_state() == SpeechState::Listening
    }

    /// Returns a clone of the current listening session, if any.
    pub fn current_session(&self) -> Result<Option<ListeningSession>, AgriPulseError> {
        let guard = self
            .session
            .lock()
            .map_err(|e| AgriPulseError::Speech(format!("Session mutex poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    /// Start listening when idle, stop when listening.
    ///
    /// With no recognizer available the user is told immediately and the
    /// state does not change. Stopping never touches the staged query.
    pub fn toggle_listening(&self) -> Result<SpeechState, AgriPulseError> {
        if !self.recognizer.is_available() {
            self.notices.show(Notice::SpeechUnavailable);
            return Err(AgriPulseError::Speech(format!(
                "recognizer '{}' is not available",
                self.recognizer.name()
            )));
        }

        match self.state_machine.current() {
            SpeechState::Idle => {
                self.recognizer.begin()?;
                self.state_machine.transition(SpeechState::Listening)?;
                let session = ListeningSession::new();
                tracing::info!(
                    session_id = %session.id,
                    recognizer = self.recognizer.name(),
                    "Listening started"
                );
                self.set_session(Some(session))?;
                Ok(SpeechState::Listening)
            }
            SpeechState::Listening => {
                if let Err(e) = self.recognizer.stop() {
                    tracing::warn!(error = %e, "Recognizer failed to stop cleanly");
                }
                self.finish("stopped by user")?;
                Ok(SpeechState::Idle)
            }
        }
    }

    /// Apply a terminal recognizer event.
    ///
    /// Returns whether the event was applied. Events that arrive while idle
    /// are stale and ignored.
    pub fn handle_event(&self, event: RecognitionEvent) -> Result<bool, AgriPulseError> {
        if self.state_machine.current() != SpeechState::Listening {
            tracing::debug!(event = ?event, "Ignoring recognition event while idle");
            return Ok(false);
        }

        match event {
            RecognitionEvent::Transcript(text) => {
                tracing::info!(chars = text.chars().count(), "Transcript received");
                self.pending.set(text);
                self.finish("transcript")?;
            }
            RecognitionEvent::Error(code) => {
                tracing::warn!(code = %code, "Speech recognition error");
                self.finish("error")?;
            }
            RecognitionEvent::Ended => {
                self.finish("ended")?;
            }
        }
        Ok(true)
    }

    fn finish(&self, reason: &str) -> Result<(), AgriPulseError> {
        self.state_machine.transition(SpeechState::Idle)?;
        if let Some(session) = self.set_session(None)? {
            tracing::info!(
                session_id = %session.id,
                elapsed_secs = session.elapsed_secs(),
                reason,
                "Listening finished"
            );
        }
        Ok(())
    }

    fn set_session(
        &self,
        session: Option<ListeningSession>,
    ) -> Result<Option<ListeningSession>, AgriPulseError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| AgriPulseError::Speech(format!("Session mutex poisoned: {}", e)))?;
        Ok(std::mem::replace(&mut *guard, session))
    }
}

// =============================================================================
// Tests
// =============================================================================
