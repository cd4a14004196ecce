//! Error types for the chat lifecycle.

/// Errors from the chat engine and its input adapters.
///
/// Dispatch never returns these to its caller; they surface from the
/// translate adapter.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a request is already in flight")]
    Busy,
    #[error("translation failed: {0}")]
    Translation(String),
    #[error("translation is not supported by {0}")]
    TranslationUnsupported(String),
}
