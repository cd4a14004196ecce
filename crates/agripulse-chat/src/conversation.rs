//! Conversation state: the ordered transcript, the active mode, and the
//! pending flag.
//!
//! The transcript is append-only. The only way to remove turns is a full
//! reset, which also gives the conversation a fresh id.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use agripulse_core::Turn;

// =============================================================================
// Conversation
// =============================================================================

/// A single conversation.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    started_at: DateTime<Utc>,
    turns: Vec<Turn>,
    active_mode: Option<String>,
    pending: bool,
    chat_open: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Create an empty, closed conversation.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            turns: Vec::new(),
            active_mode: None,
            pending: false,
            chat_open: false,
        }
    }

    /// Add a turn to the end of the transcript.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Clear the transcript, optionally seeding it with one synthesized turn.
    ///
    /// The pending flag is left alone: a call in flight still completes.
    pub fn reset(&mut self, greeting: Option<Turn>) {
        self.id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.turns.clear();
        self.turns.extend(greeting);
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    pub fn set_active_mode(&mut self, mode: Option<String>) {
        self.active_mode = mode;
    }

    pub fn set_chat_open(&mut self, open: bool) {
        self.chat_open = open;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn active_mode(&self) -> Option<&str> {
        self.active_mode.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_chat_open(&self) -> bool {
        self.chat_open
    }
}

// =============================================================================
// SharedConversation
// =============================================================================

/// What the dispatcher needs to build an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSnapshot {
    /// Conversation the user turn was appended to.
    pub conversation_id: Uuid,
    /// Full history including the new user turn.
    pub history: Vec<Turn>,
    pub mode: Option<String>,
}

/// Cloneable handle onto one conversation.
///
/// Every method takes the lock for the duration of the call only, so the
/// lock is never held across an `.await`. A poisoned lock is recovered
/// rather than reported; the state holder never fails.
#[derive(Debug, Clone, Default)]
pub struct SharedConversation {
    inner: Arc<Mutex<Conversation>>,
}

impl SharedConversation {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Conversation> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Conversation lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn append(&self, turn: Turn) {
        self.lock().append(turn);
    }

    pub fn reset(&self, greeting: Option<Turn>) {
        let mut conv = self.lock();
        let previous = conv.id();
        let lasted = Utc::now() - conv.started_at();
        conv.reset(greeting);
        tracing::debug!(
            previous_id = %previous,
            previous_secs = lasted.num_seconds(),
            conversation_id = %conv.id(),
            turns = conv.len(),
            "Conversation reset"
        );
    }

    pub fn set_pending(&self, pending: bool) {
        self.lock().set_pending(pending);
    }

    /// Atomically start a dispatch.
    ///
    /// Returns `None` without touching the transcript when a dispatch is
    /// already pending. Otherwise appends `user_turn`, sets pending, and
    /// returns the history to send.
    pub fn begin_dispatch(&self, user_turn: Turn) -> Option<DispatchSnapshot> {
        let mut conv = self.lock();
        if conv.is_pending() {
            return None;
        }
        conv.append(user_turn);
        conv.set_pending(true);
        Some(DispatchSnapshot {
            conversation_id: conv.id(),
            history: conv.turns().to_vec(),
            mode: conv.active_mode().map(str::to_string),
        })
    }

    /// Append the reply and clear pending. Returns the id of the
    /// conversation the reply landed in.
    pub fn finish_dispatch(&self, reply: Turn) -> Uuid {
        let mut conv = self.lock();
        conv.append(reply);
        conv.set_pending(false);
        conv.id()
    }

    pub fn set_active_mode(&self, mode: Option<String>) {
        self.lock().set_active_mode(mode);
    }

    pub fn set_chat_open(&self, open: bool) {
        self.lock().set_chat_open(open);
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    pub fn is_chat_open(&self) -> bool {
        self.lock().is_chat_open()
    }

    pub fn active_mode(&self) -> Option<String> {
        self.lock().active_mode().map(str::to_string)
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.lock().turns().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn id(&self) -> Uuid {
        self.lock().id()
    }

    /// A copy of the whole conversation.
    pub fn snapshot(&self) -> Conversation {
        self.lock().clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
