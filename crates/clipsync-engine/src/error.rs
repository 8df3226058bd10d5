//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while building a timeline.
///
/// All validation failures are deterministic: re-running on the same input
/// fails the same way, so none of them are retried here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Malformed detector input: {0}")]
    MalformedInput(String),

    #[error("Malformed transcript: word {index} ends at {end}s before it starts at {start}s")]
    MalformedTranscript { index: usize, start: f64, end: f64 },

    #[error("Cue {index} ends at {end}s after the next cue starts at {next_start}s")]
    OverlappingCue {
        index: usize,
        end: f64,
        next_start: f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation timed out after {0} seconds")]
    TimedOut(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create a malformed detector input error.
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::MalformedTranscript { .. } => "malformed_transcript",
            Self::OverlappingCue { .. } => "overlapping_cue",
            Self::InvalidConfig(_) => "invalid_config",
            Self::TimedOut(_) => "timed_out",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::MalformedTranscript {
            index: 3,
            start: 2.0,
            end: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "Malformed transcript: word 3 ends at 1.5s before it starts at 2s"
        );
        assert_eq!(err.kind(), "malformed_transcript");
        assert_eq!(EngineError::malformed_input("x").kind(), "malformed_input");
    }
}
