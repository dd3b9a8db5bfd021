//! Error types for the run log writer

use thiserror::Error;

/// Result type for run log operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur while writing a run log
#[derive(Debug, Error)]
pub enum LogError {
    /// Directory creation, file open or write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The log was already finalized
    #[error("run log is closed")]
    Closed,

    /// An earlier write failed; nothing more can be appended
    #[error("run log stopped after a write failure")]
    Broken,

    /// The writer thread died and could not be joined
    #[error("run log writer thread panicked")]
    WriterPanicked,
}

impl LogError {
    /// Check if this error is a use-after-close
    pub fn is_closed(&self) -> bool {
        matches!(self, LogError::Closed)
    }

    /// Check if the log no longer accepts records, either because it was
    /// closed or because a write failed
    pub fn is_shut_down(&self) -> bool {
        matches!(self, LogError::Closed | LogError::Broken)
    }
}
