//! Shared data models for the ClipSync engine.
//!
//! This crate provides Serde-serializable types for:
//! - Detector output and the normalized frames derived from it
//! - Active subjects and crop windows
//! - Transcript words and caption cues
//! - The render timeline handed to the compositor

pub mod clip;
pub mod crop;
pub mod cue;
pub mod detection;
pub mod geometry;
pub mod timeline;
pub mod transcript;

// Re-export common types
pub use clip::{ClipId, ClipInput};
pub use crop::{CropWindow, FramedWindow, PixelCrop};
pub use cue::{Cue, CueWord, HighlightWindow};
pub use detection::{
    Detection, DetectorRecord, Frame, FrameDetections, RawDetection, RawFrame, Subject,
};
pub use geometry::{AspectRatio, AspectRatioParseError, BoundingBox, SourceGeometry};
pub use timeline::{RenderInstruction, Timeline};
pub use transcript::{Transcript, Word};
