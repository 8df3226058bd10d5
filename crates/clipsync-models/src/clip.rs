//! Per-clip input bundle handed to the engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::detection::RawFrame;
use crate::geometry::SourceGeometry;
use crate::transcript::Word;

/// Unique identifier for a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the engine needs to build one clip's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipInput {
    #[serde(default)]
    pub clip_id: ClipId,
    /// Source frame size and detector sampling rate
    pub geometry: SourceGeometry,
    /// Detector output, one entry per sampled frame
    #[serde(default)]
    pub frames: Vec<RawFrame>,
    /// Clip-relative transcript words
    #[serde(default)]
    pub words: Vec<Word>,
}

impl ClipInput {
    /// Create a clip input with a fresh ID.
    pub fn new(geometry: SourceGeometry, frames: Vec<RawFrame>, words: Vec<Word>) -> Self {
        Self {
            clip_id: ClipId::new(),
            geometry,
            frames,
            words,
        }
    }

    /// Replace the generated ID.
    pub fn with_id(mut self, clip_id: ClipId) -> Self {
        self.clip_id = clip_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_input_from_json_defaults() {
        let json = r#"{"geometry":{"width":1920,"height":1080,"fps":10.0}}"#;
        let input: ClipInput = serde_json::from_str(json).unwrap();
        assert!(input.frames.is_empty());
        assert!(input.words.is_empty());
        assert!(!input.clip_id.as_str().is_empty());
    }
}
