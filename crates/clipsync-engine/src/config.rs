//! Configuration for the crop and caption engine.
//!
//! The engine recognizes exactly these eight options. Per-clip facts such
//! as source resolution and sampling rate travel with the clip in
//! [`SourceGeometry`](clipsync_models::SourceGeometry) instead.

use clipsync_models::AspectRatio;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// Configuration for one engine invocation. Read-only while a clip runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Detection ===
    /// Minimum detector confidence for a box to be considered (default: 0.5)
    pub confidence_threshold: f64,

    // === Framing ===
    /// Output width divided by output height (default: 9/16)
    pub target_aspect_ratio: f64,

    /// EMA weight given to the newest subject sample, in `(0, 1]` (default: 0.2).
    /// At 10 fps this is a ~0.45s time constant.
    pub smoothing_alpha: f64,

    /// Largest per-frame move of the window center, and largest per-frame
    /// change of window height, as a fraction of the source frame (default: 0.04)
    pub max_window_delta_per_frame: f64,

    // === Captions ===
    /// Maximum words on one caption line (default: 4)
    pub max_words_per_line: usize,

    /// Maximum span of one caption line in seconds (default: 2.5)
    pub max_line_duration_seconds: f64,

    /// Pause between words that forces a new line, in seconds (default: 0.6)
    pub silence_break_seconds: f64,

    /// Minimum on-screen time for a word shorter than this, in seconds (default: 0.1).
    /// Must be positive so zero-length words still produce a visible cue.
    pub min_word_visible_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,

            target_aspect_ratio: AspectRatio::PORTRAIT.ratio(),
            smoothing_alpha: 0.2,
            max_window_delta_per_frame: 0.04,

            max_words_per_line: 4,
            max_line_duration_seconds: 2.5,
            silence_break_seconds: 0.6,
            min_word_visible_seconds: 0.1,
        }
    }
}

impl EngineConfig {
    /// Snappier tracking and shorter lines for fast-paced talking heads.
    pub fn responsive() -> Self {
        Self {
            smoothing_alpha: 0.35,
            max_window_delta_per_frame: 0.08,
            max_words_per_line: 3,
            max_line_duration_seconds: 1.8,
            ..Default::default()
        }
    }

    /// Slow, steady camera and longer lines for interviews.
    pub fn cinematic() -> Self {
        Self {
            smoothing_alpha: 0.12,
            max_window_delta_per_frame: 0.025,
            max_words_per_line: 5,
            max_line_duration_seconds: 3.0,
            silence_break_seconds: 0.8,
            ..Default::default()
        }
    }

    /// Use an integer aspect ratio such as 9:16 or 4:5.
    pub fn with_aspect(mut self, aspect: AspectRatio) -> Self {
        self.target_aspect_ratio = aspect.ratio();
        self
    }

    /// EMA alpha giving a `response_seconds` time constant at `fps`.
    ///
    /// Returns `None` when either argument is not a positive finite number.
    pub fn alpha_for_response_time(fps: f64, response_seconds: f64) -> Option<f64> {
        if !(fps.is_finite() && fps > 0.0 && response_seconds.is_finite() && response_seconds > 0.0)
        {
            return None;
        }
        let dt = 1.0 / fps;
        Some(1.0 - (-dt / response_seconds).exp())
    }

    /// Create config from `CLIPSYNC_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            confidence_threshold: env_or("CLIPSYNC_CONFIDENCE_THRESHOLD", defaults.confidence_threshold),
            target_aspect_ratio: std::env::var("CLIPSYNC_TARGET_ASPECT")
                .ok()
                .and_then(|s| parse_aspect(&s))
                .unwrap_or(defaults.target_aspect_ratio),
            smoothing_alpha: env_or("CLIPSYNC_SMOOTHING_ALPHA", defaults.smoothing_alpha),
            max_window_delta_per_frame: env_or(
                "CLIPSYNC_MAX_WINDOW_DELTA",
                defaults.max_window_delta_per_frame,
            ),
            max_words_per_line: env_or("CLIPSYNC_MAX_WORDS_PER_LINE", defaults.max_words_per_line),
            max_line_duration_seconds: env_or(
                "CLIPSYNC_MAX_LINE_DURATION",
                defaults.max_line_duration_seconds,
            ),
            silence_break_seconds: env_or("CLIPSYNC_SILENCE_BREAK", defaults.silence_break_seconds),
            min_word_visible_seconds: env_or(
                "CLIPSYNC_MIN_WORD_VISIBLE",
                defaults.min_word_visible_seconds,
            ),
        }
    }

    /// Check every option is finite and in range.
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(EngineError::invalid_config(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(self.target_aspect_ratio.is_finite() && self.target_aspect_ratio > 0.0) {
            return Err(EngineError::invalid_config(format!(
                "target_aspect_ratio must be positive, got {}",
                self.target_aspect_ratio
            )));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(EngineError::invalid_config(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        if !(self.max_window_delta_per_frame.is_finite() && self.max_window_delta_per_frame > 0.0) {
            return Err(EngineError::invalid_config(format!(
                "max_window_delta_per_frame must be positive, got {}",
                self.max_window_delta_per_frame
            )));
        }
        if self.max_words_per_line == 0 {
            return Err(EngineError::invalid_config(
                "max_words_per_line must be at least 1",
            ));
        }
        if !(self.max_line_duration_seconds.is_finite() && self.max_line_duration_seconds > 0.0) {
            return Err(EngineError::invalid_config(format!(
                "max_line_duration_seconds must be positive, got {}",
                self.max_line_duration_seconds
            )));
        }
        if !(self.silence_break_seconds.is_finite() && self.silence_break_seconds >= 0.0) {
            return Err(EngineError::invalid_config(format!(
                "silence_break_seconds must be non-negative, got {}",
                self.silence_break_seconds
            )));
        }
        if !(self.min_word_visible_seconds.is_finite() && self.min_word_visible_seconds > 0.0) {
            return Err(EngineError::invalid_config(format!(
                "min_word_visible_seconds must be positive, got {}",
                self.min_word_visible_seconds
            )));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Accept either `W:H` or a decimal ratio.
fn parse_aspect(raw: &str) -> Option<f64> {
    if let Ok(aspect) = raw.parse::<AspectRatio>() {
        return Some(aspect.ratio());
    }
    raw.trim().parse::<f64>().ok().filter(|r| r.is_finite() && *r > 0.0)
}
