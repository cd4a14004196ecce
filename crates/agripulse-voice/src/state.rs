//! Speech capture state machine with thread-safe transitions.
//!
//! - Idle -> Listening (recognizer started)
//! - Listening -> Idle (transcript, error, end of input, or toggled off)

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use agripulse_core::AgriPulseError;

/// Operational state of the speech adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechState {
    /// Not listening. Ready to start.
    Idle,
    /// Waiting for the recognizer to report a terminal event.
    Listening,
}

impl fmt::Display for SpeechState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechState::Idle => write!(f, "Idle"),
            SpeechState::Listening => write!(f, "Listening"),
        }
    }
}

impl SpeechState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SpeechState) -> bool {
        matches!(
            (self, target),
            (SpeechState::Idle, SpeechState::Listening) | (SpeechState::Listening, SpeechState::Idle)
        )
    }
}

/// Thread-safe state machine for speech capture.
///
/// Clones share the same state. Transitions are validated before being
/// applied.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<SpeechState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SpeechState::Idle)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpeechState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Speech state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn current(&self) -> SpeechState {
        *self.lock()
    }

    /// Attempt to transition to the target state.
    ///
    /// Returns `AgriPulseError::Speech` if the transition is not allowed from
    /// the current state.
    pub fn transition(&self, target: SpeechState) -> Result<(), AgriPulseError> {
        let mut state = self.lock();
        if state.can_transition_to(&target) {
            tracing::debug!("Speech state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(AgriPulseError::Speech(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
