//! Error types for FrameLab.

use thiserror::Error;

/// Main error type for FrameLab operations.
#[derive(Error, Debug)]
pub enum FrameLabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored snapshot could not be decompressed or decoded.
    #[error("Corrupt history entry: {0}")]
    CorruptEntry(String),

    /// A pixel operation faulted; the input buffer is untouched.
    #[error("Transform failed: {0}")]
    TransformFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's stop token fired between stages.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FrameLabError {
    /// Whether the error came from a stored snapshot rather than the caller.
    pub fn is_corrupt_entry(&self) -> bool {
        matches!(self, Self::CorruptEntry(_))
    }
}

/// Result type alias for FrameLab operations.
pub type Result<T> = std::result::Result<T, FrameLabError>;
