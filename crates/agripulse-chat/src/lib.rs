//! Chat lifecycle for AgriPulse.
//!
//! Holds the conversation, dispatches user messages to the language model,
//! switches topical modes, translates staged text, and gates the splash
//! screen. `ChatController` ties these together for a front end.

pub mod controller;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod modes;
pub mod splash;
pub mod translate;

pub use controller::ChatController;
pub use conversation::{Conversation, DispatchSnapshot, SharedConversation};
pub use dispatcher::{DispatchOutcome, QueryDispatcher, APOLOGY_TEXT, EMPTY_REPLY_FALLBACK};
pub use error::ChatError;
pub use modes::{greeting, suggestions_for, system_instruction, ModeSelector, CATEGORIES};
pub use splash::{SplashGate, SPLASH_MARKER_KEY};
pub use translate::Translator;
