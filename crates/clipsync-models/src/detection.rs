//! Detector-side data: raw model output and the normalized frames ingest produces.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// A single box as emitted by the person detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawDetection {
    /// Box in normalized frame coordinates (may spill outside `[0, 1]`)
    pub bbox: BoundingBox,
    /// Detector confidence
    pub confidence: f64,
}

impl RawDetection {
    /// Create a new raw detection.
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// Detector output for one sampled frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawFrame {
    /// Sample index within the clip
    pub frame_index: u64,
    /// Absolute timestamp in seconds
    pub timestamp: f64,
    /// Zero or more detections
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl RawFrame {
    /// Create a frame with detections.
    pub fn new(frame_index: u64, timestamp: f64, detections: Vec<RawDetection>) -> Self {
        Self {
            frame_index,
            timestamp,
            detections,
        }
    }

    /// Create a frame where the detector found nothing.
    pub fn empty(frame_index: u64, timestamp: f64) -> Self {
        Self::new(frame_index, timestamp, Vec::new())
    }
}

/// Flat detector record: one detection tagged with its frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectorRecord {
    pub frame_index: u64,
    pub timestamp: f64,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl DetectorRecord {
    pub fn new(frame_index: u64, timestamp: f64, bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            frame_index,
            timestamp,
            bbox,
            confidence,
        }
    }
}

/// A sampled frame: index plus absolute timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    /// Sample index within the clip
    pub index: u64,
    /// Timestamp in seconds
    pub timestamp: f64,
}

impl Frame {
    /// Create a new frame.
    pub fn new(index: u64, timestamp: f64) -> Self {
        Self { index, timestamp }
    }
}

/// A filtered, clamped detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    /// Box clamped into the unit square
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`
    pub confidence: f64,
}

impl Detection {
    /// Create a new detection.
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// A frame together with the detections that survived ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameDetections {
    pub frame: Frame,
    pub detections: Vec<Detection>,
}

impl FrameDetections {
    /// Create a new frame record.
    pub fn new(frame: Frame, detections: Vec<Detection>) -> Self {
        Self { frame, detections }
    }

    /// True when no detection qualified for this frame.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// The active subject chosen for one frame.
///
/// Center and size are normalized frame coordinates. Subjects carry no
/// identity across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Subject {
    /// Center x-coordinate
    pub cx: f64,
    /// Center y-coordinate
    pub cy: f64,
    /// Subject width
    pub width: f64,
    /// Subject height
    pub height: f64,
    /// Confidence of the chosen detection
    pub confidence: f64,
    /// Position of the chosen detection within its frame
    pub detection_index: usize,
}

impl Subject {
    /// Build a subject from the detection at `detection_index`.
    pub fn from_detection(detection: &Detection, detection_index: usize) -> Self {
        Self {
            cx: detection.bbox.cx(),
            cy: detection.bbox.cy(),
            width: detection.bbox.width,
            height: detection.bbox.height,
            confidence: detection.confidence,
            detection_index,
        }
    }
}
