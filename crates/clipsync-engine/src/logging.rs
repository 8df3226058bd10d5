//! Structured per-clip logging.
//!
//! Provides consistent log lines carrying the clip ID and operation name,
//! and the span every engine stage runs inside.

use clipsync_models::ClipId;
use tracing::{error, info, info_span, warn, Span};

/// Clip logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct ClipLogger {
    clip_id: String,
    operation: String,
}

impl ClipLogger {
    /// Create a new logger for a clip and operation.
    ///
    /// # Arguments
    /// * `clip_id` - The clip being processed
    /// * `operation` - Operation name (e.g. "build_timeline")
    pub fn new(clip_id: &ClipId, operation: &str) -> Self {
        Self {
            clip_id: clip_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Span that engine stages run inside.
    pub fn span(&self) -> Span {
        info_span!("clip", clip_id = %self.clip_id, operation = %self.operation)
    }

    /// Log the start of an operation.
    pub fn log_start(&self, message: &str) {
        info!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip started: {}", message
        );
    }

    /// Log a recoverable oddity in the input.
    pub fn log_warning(&self, message: &str) {
        warn!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip warning: {}", message
        );
    }

    /// Log successful completion.
    pub fn log_completion(&self, message: &str, duration_secs: f64) {
        info!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            duration_ms = (duration_secs * 1000.0) as u64,
            "Clip completed: {}", message
        );
    }

    /// Log a failure.
    pub fn log_error(&self, kind: &str, message: &str) {
        error!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            error_kind = kind,
            "Clip failed: {}", message
        );
    }
}
