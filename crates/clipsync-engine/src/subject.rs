//! Active subject selection.
//!
//! Picks at most one detection per frame for the camera to follow, using a
//! pure scoring formula:
//!
//! ```text
//! score = confidence × area × centrality
//! centrality = 1 / (1 + CENTRALITY_FALLOFF × distance_to_frame_center)
//! ```
//!
//! Ties go to the larger box, then to the lowest detection index, so the
//! choice is fully deterministic. Nothing is carried between frames.

use clipsync_models::{BoundingBox, Detection, FrameDetections, Subject};
use tracing::debug;

/// Steepness of the centrality decay. Distance is in normalized frame
/// units, so a box in a corner (distance ~0.71) weighs ~0.41 of a centered one.
pub const CENTRALITY_FALLOFF: f64 = 2.0;

/// Score components for one candidate detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    /// Position of the detection within its frame
    pub index: usize,
    /// Normalized box area
    pub area: f64,
    /// Centrality weight in `(0, 1]`
    pub centrality: f64,
    /// Final score
    pub score: f64,
}

/// Centrality weight for a box: 1 at the frame center, decaying with distance.
pub fn centrality_weight(bbox: &BoundingBox) -> f64 {
    1.0 / (1.0 + CENTRALITY_FALLOFF * bbox.distance_from_center())
}

/// Score a single detection.
pub fn score_detection(index: usize, detection: &Detection) -> CandidateScore {
    let area = detection.bbox.area();
    let centrality = centrality_weight(&detection.bbox);
    CandidateScore {
        index,
        area,
        centrality,
        score: detection.confidence * area * centrality,
    }
}

/// Choose the active subject among one frame's detections.
pub fn select_subject(detections: &[Detection]) -> Option<Subject> {
    match detections {
        [] => None,
        [only] => Some(Subject::from_detection(only, 0)),
        _ => {
            let mut best = score_detection(0, &detections[0]);
            for (index, detection) in detections.iter().enumerate().skip(1) {
                let candidate = score_detection(index, detection);
                let better = candidate.score > best.score
                    || (candidate.score == best.score && candidate.area > best.area);
                if better {
                    best = candidate;
                }
            }
            Some(Subject::from_detection(&detections[best.index], best.index))
        }
    }
}

/// Resolves the active subject for every frame of a clip.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubjectTracker;

impl SubjectTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self
    }

    /// One entry per input frame; `None` marks frames with no qualifying
    /// detection. Gaps are left for the planner to fill.
    pub fn track(&self, frames: &[FrameDetections]) -> Vec<Option<Subject>> {
        let subjects: Vec<Option<Subject>> = frames
            .iter()
            .map(|fd| select_subject(&fd.detections))
            .collect();

        let absent = subjects.iter().filter(|s| s.is_none()).count();
        debug!(
            frames = frames.len(),
            absent,
            "Resolved active subjects"
        );

        subjects
    }
}
