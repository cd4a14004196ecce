use thiserror::Error;

/// Top-level error type for AgriPulse.
///
/// Subsystem crates define their own error types and implement
/// `From<AgriPulseError>` (or the reverse) so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgriPulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session store error: {0}")]
    Session(String),

    #[error("Speech error: {0}")]
    Speech(String),
}

impl From<toml::de::Error> for AgriPulseError {
    fn from(err: toml::de::Error) -> Self {
        AgriPulseError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AgriPulseError {
    fn from(err: toml::ser::Error) -> Self {
        AgriPulseError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AgriPulseError {
    fn from(err: serde_json::Error) -> Self {
        AgriPulseError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for AgriPulse operations.
pub type Result<T> = std::result::Result<T, AgriPulseError>;
