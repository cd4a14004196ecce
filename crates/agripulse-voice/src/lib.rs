//! Voice input for AgriPulse.
//!
//! A two-state speech adapter (Idle -> Listening -> Idle) that turns
//! recognizer events into the staged query. Recognizers are pluggable so
//! the adapter can be driven by synthetic events in tests.

pub mod adapter;
pub mod recognizer;
pub mod state;

pub use adapter::{ListeningSession, SpeechAdapter};
pub use recognizer::{RecognitionEvent, SpeechRecognizer, TypedRecognizer, UnavailableRecognizer};
pub use state::{SpeechState, StateMachine};
