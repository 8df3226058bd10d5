//! Metrics emitted through the `metrics` facade.
//!
//! The engine only records; installing an exporter is the host's job.
//! Without a recorder every call is a no-op.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const CLIPS_PROCESSED_TOTAL: &str = "clipsync_clips_processed_total";
    pub const CLIPS_FAILED_TOTAL: &str = "clipsync_clips_failed_total";
    pub const ENGINE_DURATION_SECONDS: &str = "clipsync_engine_duration_seconds";

    pub const FRAMES_INGESTED_TOTAL: &str = "clipsync_frames_ingested_total";
    pub const DETECTIONS_DROPPED_TOTAL: &str = "clipsync_detections_dropped_total";
    pub const TIMESTAMPS_RECONSTRUCTED_TOTAL: &str = "clipsync_timestamps_reconstructed_total";
    pub const FRAMES_WITHOUT_SUBJECT_TOTAL: &str = "clipsync_frames_without_subject_total";
    pub const CUES_BUILT_TOTAL: &str = "clipsync_cues_built_total";
}

/// Record a clip that produced a timeline.
pub fn record_clip_processed(duration_secs: f64) {
    counter!(names::CLIPS_PROCESSED_TOTAL).increment(1);
    histogram!(names::ENGINE_DURATION_SECONDS).record(duration_secs);
}

/// Record a clip that failed, labelled by error kind.
pub fn record_clip_failed(kind: &'static str) {
    counter!(names::CLIPS_FAILED_TOTAL, "kind" => kind).increment(1);
}

/// Record ingest statistics.
pub fn record_ingest(frames: usize, dropped_detections: usize, reconstructed: usize) {
    counter!(names::FRAMES_INGESTED_TOTAL).increment(frames as u64);
    counter!(names::DETECTIONS_DROPPED_TOTAL).increment(dropped_detections as u64);
    counter!(names::TIMESTAMPS_RECONSTRUCTED_TOTAL).increment(reconstructed as u64);
}

/// Record frames where no subject qualified.
pub fn record_frames_without_subject(count: usize) {
    counter!(names::FRAMES_WITHOUT_SUBJECT_TOTAL).increment(count as u64);
}

/// Record caption cues built.
pub fn record_cues_built(count: usize) {
    counter!(names::CUES_BUILT_TOTAL).increment(count as u64);
}
