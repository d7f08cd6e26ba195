use thiserror::Error;

/// Top-level error type for the Headway system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for HeadwayError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeadwayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gesture error: {0}")]
    Gesture(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Injection error: {0}")]
    Injection(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HeadwayError {
    fn from(err: serde_json::Error) -> Self {
        HeadwayError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Headway operations.
pub type Result<T> = std::result::Result<T, HeadwayError>;
