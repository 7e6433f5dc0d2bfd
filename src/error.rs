//! Turnflow Error Types
//!
//! Centralized error handling for the capture, recognition and delivery layers.

use thiserror::Error;

/// Central error type for Turnflow
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sample rate mismatch: recognizer expects {expected} Hz, audio source delivers {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Audio capture error: {0}")]
    Audio(String),

    #[error("ASR engine error: {0}")]
    Asr(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Turnflow operations
pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// True for failures that only affect the current turn.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FlowError::Channel(_) | FlowError::Timeout(_) | FlowError::Protocol(_) | FlowError::Io(_)
        )
    }
}
