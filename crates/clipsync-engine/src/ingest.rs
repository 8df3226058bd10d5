//! Detection ingest: normalizes raw detector output into ordered frames.
//!
//! Responsibilities:
//! - Drop detections below the confidence threshold or with unusable boxes
//! - Clip boxes into the unit square and drop exact duplicates
//! - Collapse repeated frame indices (last write wins)
//! - Repair non-monotonic timestamps from the sampling rate when possible
//! - Insert empty frames for skipped indices so every sample has a slot

use std::collections::BTreeMap;

use clipsync_models::{
    Detection, DetectorRecord, Frame, FrameDetections, RawDetection, RawFrame, SourceGeometry,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Upper bound on frames inserted to fill index gaps in one clip.
const MAX_FILLED_FRAMES: u64 = 1_000_000;

/// Ingest output plus counters describing what was repaired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutput {
    /// Frames ordered by index with strictly increasing timestamps
    pub frames: Vec<FrameDetections>,
    /// Detections removed (low confidence, degenerate box, duplicate)
    pub dropped_detections: usize,
    /// Boxes that had to be clipped into the frame
    pub clamped_boxes: usize,
    /// Frame entries overwritten by a later entry with the same index
    pub duplicate_frames: usize,
    /// Timestamps rebuilt from the sampling rate
    pub reconstructed_timestamps: usize,
    /// Empty frames inserted for skipped indices
    pub filled_frames: usize,
}

/// Normalizes detector output for one clip.
pub struct DetectionIngest {
    confidence_threshold: f64,
    frame_interval: Option<f64>,
}

impl DetectionIngest {
    /// Create an ingest stage for a clip.
    pub fn new(config: &EngineConfig, geometry: &SourceGeometry) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            frame_interval: geometry.frame_interval(),
        }
    }

    /// Normalize per-frame detector output.
    ///
    /// An empty input, or frames without detections, are valid. Fails with
    /// [`EngineError::MalformedInput`] only when a timestamp is out of order
    /// and cannot be rebuilt from its neighbours and the sampling rate.
    pub fn ingest(&self, raw_frames: &[RawFrame]) -> EngineResult<IngestOutput> {
        let mut output = IngestOutput::default();

        // Last write wins for repeated indices
        let mut by_index: BTreeMap<u64, &RawFrame> = BTreeMap::new();
        for frame in raw_frames {
            if by_index.insert(frame.frame_index, frame).is_some() {
                output.duplicate_frames += 1;
            }
        }
        if output.duplicate_frames > 0 {
            warn!(
                "Detector repeated {} frame indices; keeping the last entry for each",
                output.duplicate_frames
            );
        }

        let ordered: Vec<&RawFrame> = by_index.into_values().collect();
        let timestamps = self.resolve_timestamps(&ordered, &mut output.reconstructed_timestamps)?;

        let mut frames = Vec::with_capacity(ordered.len());
        for (raw, timestamp) in ordered.iter().zip(timestamps) {
            let detections = self.filter_detections(&raw.detections, &mut output);
            frames.push(FrameDetections::new(
                Frame::new(raw.frame_index, timestamp),
                detections,
            ));
        }

        output.frames = fill_index_gaps(frames, &mut output.filled_frames)?;

        if output.clamped_boxes > 0 {
            warn!(
                clamped = output.clamped_boxes,
                "Detector produced boxes outside the frame; clipped them"
            );
        }

        debug!(
            frames = output.frames.len(),
            dropped = output.dropped_detections,
            clamped = output.clamped_boxes,
            reconstructed = output.reconstructed_timestamps,
            filled = output.filled_frames,
            "Ingested detector output"
        );

        Ok(output)
    }

    /// Apply confidence threshold, clamp boxes and drop exact duplicates.
    fn filter_detections(
        &self,
        raw: &[RawDetection],
        output: &mut IngestOutput,
    ) -> Vec<Detection> {
        let mut kept: Vec<Detection> = Vec::with_capacity(raw.len());

        for det in raw {
            if !det.confidence.is_finite()
                || det.confidence < self.confidence_threshold
                || !det.bbox.is_finite()
            {
                output.dropped_detections += 1;
                continue;
            }

            let clamped = det.bbox.clamp_unit();
            if clamped.area() <= 0.0 {
                output.dropped_detections += 1;
                continue;
            }
            if clamped != det.bbox {
                output.clamped_boxes += 1;
            }

            let detection = Detection::new(clamped, det.confidence.min(1.0));
            if kept.contains(&detection) {
                output.dropped_detections += 1;
                continue;
            }
            kept.push(detection);
        }

        kept
    }

    /// Produce strictly increasing timestamps for index-ordered frames.
    ///
    /// A timestamp is trusted when it is finite and later than the previous
    /// accepted one, unless the next finite raw value is not after it. In
    /// that case one of the two is an outlier, and the one further from the
    /// sampling-rate prediction is blamed. Untrusted values are rebuilt as
    /// `previous + index_gap / fps`.
    ///
    /// Without a usable sampling rate nothing can be rebuilt, so any
    /// untrusted value fails with [`EngineError::MalformedInput`].
    fn resolve_timestamps(
        &self,
        frames: &[&RawFrame],
        reconstructed: &mut usize,
    ) -> EngineResult<Vec<f64>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let mut resolved: Vec<f64> = Vec::with_capacity(frames.len());
        resolved.push(self.resolve_first(frames, reconstructed)?);

        for i in 1..frames.len() {
            let frame = frames[i];
            let ts = frame.timestamp;
            let prev_index = frames[i - 1].frame_index;
            let prev_ts = resolved[i - 1];

            let usable = ts.is_finite() && ts > prev_ts;
            let blamed = usable
                && next_finite(frames, i).map_or(false, |next| {
                    next.timestamp <= ts
                        && self.is_worse_outlier(frame, next, (prev_index, prev_ts))
                });
            if usable && !blamed {
                resolved.push(ts);
                continue;
            }

            let interval = self.frame_interval.ok_or_else(|| {
                EngineError::malformed_input(format!(
                    "frame {} has timestamp {} out of order and the sampling rate is unknown",
                    frame.frame_index, ts
                ))
            })?;

            let rebuilt = prev_ts + (frame.frame_index - prev_index) as f64 * interval;
            warn!(
                frame_index = frame.frame_index,
                raw = ts,
                rebuilt,
                "Reconstructed out-of-order frame timestamp"
            );
            *reconstructed += 1;
            resolved.push(rebuilt);
        }

        Ok(resolved)
    }

    /// First frame: trusted when finite and before the next finite frame.
    ///
    /// When the two disagree, the frame after them decides which one is the
    /// outlier. A blamed or non-finite first timestamp is rebuilt backwards
    /// from the next finite frame.
    fn resolve_first(&self, frames: &[&RawFrame], reconstructed: &mut usize) -> EngineResult<f64> {
        let frame = frames[0];
        let ts = frame.timestamp;
        let next = next_finite(frames, 0);

        if ts.is_finite() {
            let Some(next) = next else {
                return Ok(ts);
            };
            if next.timestamp > ts {
                return Ok(ts);
            }
            // Without a third frame there is nothing to arbitrate; keep the first
            let keep_first = match next_finite_after(frames, next.frame_index) {
                Some(reference) => {
                    !self.is_worse_outlier(frame, next, (reference.frame_index, reference.timestamp))
                }
                None => true,
            };
            if keep_first {
                return Ok(ts);
            }
        }

        match (next, self.frame_interval) {
            (Some(next), Some(interval)) => {
                let rebuilt =
                    next.timestamp - (next.frame_index - frame.frame_index) as f64 * interval;
                warn!(
                    frame_index = frame.frame_index,
                    raw = ts,
                    rebuilt,
                    "Reconstructed first frame timestamp"
                );
                *reconstructed += 1;
                Ok(rebuilt)
            }
            _ => Err(EngineError::malformed_input(format!(
                "frame {} has unusable timestamp {} and cannot be reconstructed",
                frame.frame_index, ts
            ))),
        }
    }

    /// Whether `current` strays further than `next` from the timestamps the
    /// sampling rate predicts from `reference`. Without a sampling rate the
    /// current frame is never blamed.
    fn is_worse_outlier(&self, current: &RawFrame, next: &RawFrame, reference: (u64, f64)) -> bool {
        let Some(interval) = self.frame_interval else {
            return false;
        };
        let (ref_index, ref_ts) = reference;
        let predict = |index: u64| ref_ts + (index as f64 - ref_index as f64) * interval;

        let current_error = (current.timestamp - predict(current.frame_index)).abs();
        let next_error = (next.timestamp - predict(next.frame_index)).abs();
        current_error > next_error
    }
}

/// First frame after position `i` with a finite timestamp.
fn next_finite<'a>(frames: &[&'a RawFrame], i: usize) -> Option<&'a RawFrame> {
    frames[i + 1..]
        .iter()
        .copied()
        .find(|f| f.timestamp.is_finite())
}

/// First frame with a finite timestamp and an index above `index`.
fn next_finite_after<'a>(frames: &[&'a RawFrame], index: u64) -> Option<&'a RawFrame> {
    frames
        .iter()
        .copied()
        .find(|f| f.frame_index > index && f.timestamp.is_finite())
}

/// Insert empty frames for skipped indices, interpolating their timestamps.
fn fill_index_gaps(
    frames: Vec<FrameDetections>,
    filled: &mut usize,
) -> EngineResult<Vec<FrameDetections>> {
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return Ok(frames);
    };

    let span = last
        .frame
        .index
        .checked_sub(first.frame.index)
        .and_then(|d| d.checked_add(1))
        .ok_or_else(|| {
            EngineError::malformed_input(format!(
                "frame indices {} to {} span more samples than can be counted",
                first.frame.index, last.frame.index
            ))
        })?;
    let missing = span.saturating_sub(frames.len() as u64);
    if missing == 0 {
        return Ok(frames);
    }
    if missing > MAX_FILLED_FRAMES {
        return Err(EngineError::malformed_input(format!(
            "frame indices skip {} samples between {} and {}",
            missing, first.frame.index, last.frame.index
        )));
    }

    let mut out = Vec::with_capacity(span as usize);
    let mut iter = frames.into_iter().peekable();
    while let Some(current) = iter.next() {
        let a = current.frame;
        out.push(current);

        if let Some(next) = iter.peek() {
            let b = next.frame;
            let gap = b.index - a.index;
            for k in 1..gap {
                let t = k as f64 / gap as f64;
                let frame = Frame::new(a.index + k, a.timestamp + t * (b.timestamp - a.timestamp));
                out.push(FrameDetections::new(frame, Vec::new()));
                *filled += 1;
            }
        }
    }

    Ok(out)
}

/// Group flat detector records into frames.
///
/// Records sharing a frame index are detections of the same frame. When
/// they disagree on the timestamp the last one seen wins.
pub fn group_records(records: &[DetectorRecord]) -> Vec<RawFrame> {
    let mut by_index: BTreeMap<u64, RawFrame> = BTreeMap::new();

    for record in records {
        let frame = by_index
            .entry(record.frame_index)
            .or_insert_with(|| RawFrame::empty(record.frame_index, record.timestamp));
        frame.timestamp = record.timestamp;
        frame
            .detections
            .push(RawDetection::new(record.bbox, record.confidence));
    }

    by_index.into_values().collect()
}
