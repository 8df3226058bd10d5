//! End-to-end timeline construction for one clip, plus batch and deadline
//! helpers for running many clips.

use std::time::{Duration, Instant};

use clipsync_models::{ClipInput, Frame, FrameDetections, Timeline};
use rayon::prelude::*;
use tracing::Instrument;

use crate::captions::{CaptionTimelineBuilder, KeywordLexicon};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ingest::DetectionIngest;
use crate::logging::ClipLogger;
use crate::metrics;
use crate::mux::TimelineMux;
use crate::planner::CropTrajectoryPlanner;
use crate::subject::SubjectTracker;

/// Runs the full pipeline for a clip.
///
/// Holds only read-only configuration, so one engine can be shared across
/// threads and clips.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    lexicon: Option<KeywordLexicon>,
}

impl Engine {
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            lexicon: None,
        })
    }

    /// Highlight lexicon words in addition to transcriber keywords.
    pub fn with_lexicon(mut self, lexicon: KeywordLexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the timeline for one clip.
    ///
    /// Either returns a complete timeline or fails before producing anything.
    pub fn build_timeline(&self, clip: &ClipInput) -> EngineResult<Timeline> {
        let logger = ClipLogger::new(&clip.clip_id, "build_timeline");
        let _entered = logger.span().entered();
        let started = Instant::now();

        logger.log_start(&format!(
            "{} detector frames, {} words",
            clip.frames.len(),
            clip.words.len()
        ));

        match self.run_pipeline(clip, &logger) {
            Ok(timeline) => {
                let elapsed = started.elapsed().as_secs_f64();
                metrics::record_clip_processed(elapsed);
                logger.log_completion(
                    &format!(
                        "{} crop frames, {} cues",
                        timeline.crop_track.len(),
                        timeline.cues.len()
                    ),
                    elapsed,
                );
                Ok(timeline)
            }
            Err(e) => {
                metrics::record_clip_failed(e.kind());
                logger.log_error(e.kind(), &e.to_string());
                Err(e)
            }
        }
    }

    fn run_pipeline(&self, clip: &ClipInput, logger: &ClipLogger) -> EngineResult<Timeline> {
        let geometry = &clip.geometry;
        if geometry.width == 0 || geometry.height == 0 {
            return Err(EngineError::malformed_input(format!(
                "source geometry {}x{} has no area",
                geometry.width, geometry.height
            )));
        }

        // Stage 1: normalize detector output
        let ingest = DetectionIngest::new(&self.config, geometry).ingest(&clip.frames)?;
        metrics::record_ingest(
            ingest.frames.len(),
            ingest.dropped_detections,
            ingest.reconstructed_timestamps,
        );
        if ingest.reconstructed_timestamps > 0 {
            logger.log_warning(&format!(
                "rebuilt {} out-of-order timestamps",
                ingest.reconstructed_timestamps
            ));
        }

        let mut frames = ingest.frames;
        if frames.is_empty() {
            logger.log_warning("no detector frames; using a single default crop at t=0");
            frames.push(FrameDetections::new(Frame::new(0, 0.0), Vec::new()));
        }

        // Stage 2: pick the active subject per frame
        let subjects = SubjectTracker::new().track(&frames);
        metrics::record_frames_without_subject(subjects.iter().filter(|s| s.is_none()).count());

        // Stage 3: smooth crop trajectory
        let frame_list: Vec<Frame> = frames.iter().map(|fd| fd.frame).collect();
        let trajectory =
            CropTrajectoryPlanner::new(&self.config, geometry).plan(&frame_list, &subjects)?;

        // Stage 4: caption cues
        let mut captions = CaptionTimelineBuilder::new(&self.config);
        if let Some(lexicon) = &self.lexicon {
            captions = captions.with_lexicon(lexicon.clone());
        }
        let cues = captions.build(&clip.words)?;
        metrics::record_cues_built(cues.len());

        // Stage 5: merge
        TimelineMux::new().mux(trajectory.windows, cues)
    }
}

/// Build one clip's timeline with the given configuration.
pub fn build_timeline(clip: &ClipInput, config: &EngineConfig) -> EngineResult<Timeline> {
    Engine::new(config.clone())?.build_timeline(clip)
}

/// Build timelines for independent clips in parallel.
///
/// Results come back in input order. An invalid configuration fails every
/// clip with the same error.
pub fn process_batch(clips: &[ClipInput], config: &EngineConfig) -> Vec<EngineResult<Timeline>> {
    let engine = match Engine::new(config.clone()) {
        Ok(engine) => engine,
        Err(e) => return clips.iter().map(|_| Err(e.clone())).collect(),
    };

    clips
        .par_iter()
        .map(|clip| engine.build_timeline(clip))
        .collect()
}

/// Build a timeline on the blocking pool, giving up after `deadline`.
///
/// On expiry the result is discarded and [`EngineError::TimedOut`] is
/// returned; the computation itself is not interrupted.
pub async fn run_with_deadline(
    clip: ClipInput,
    config: EngineConfig,
    deadline: Duration,
) -> EngineResult<Timeline> {
    let engine = Engine::new(config)?;
    let span = tracing::info_span!("deadline", clip_id = %clip.clip_id);

    let task = tokio::task::spawn_blocking(move || engine.build_timeline(&clip));

    async move {
        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(EngineError::internal(format!(
                "timeline task failed: {}",
                join_error
            ))),
            Err(_) => {
                tracing::warn!(deadline_secs = deadline.as_secs_f64(), "Clip timed out");
                metrics::record_clip_failed("timed_out");
                Err(EngineError::TimedOut(deadline.as_secs()))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsync_models::{BoundingBox, RawDetection, RawFrame, SourceGeometry, Word};

    fn clip_with_subject(frames: u64) -> ClipInput {
        let raw = (0..frames)
            .map(|i| {
                RawFrame::new(
                    i,
                    i as f64 * 0.1,
                    vec![RawDetection::new(BoundingBox::new(0.25, 0.25, 0.125, 0.5), 0.9)],
                )
            })
            .collect();
        ClipInput::new(
            SourceGeometry::hd_1080p(10.0),
            raw,
            vec![Word::new("hello", 0.0, 0.5)],
        )
    }

    #[test]
    fn test_build_timeline_end_to_end() {
        let timeline = build_timeline(&clip_with_subject(10), &EngineConfig::default()).unwrap();
        assert_eq!(timeline.crop_track.len(), 10);
        assert_eq!(timeline.cues.len(), 1);
        assert_eq!(timeline.instructions.len(), 12);
    }

    #[test]
    fn test_empty_clip_gets_default_crop() {
        let clip = ClipInput::new(SourceGeometry::hd_1080p(10.0), Vec::new(), Vec::new());
        let timeline = build_timeline(&clip, &EngineConfig::default()).unwrap();

        assert_eq!(timeline.crop_track.len(), 1);
        assert!(timeline.cues.is_empty());
        assert!((timeline.crop_track[0].window.height - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            smoothing_alpha: 2.0,
            ..Default::default()
        };
        let err = build_timeline(&clip_with_subject(2), &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_area_geometry_rejected() {
        let mut clip = clip_with_subject(2);
        clip.geometry = SourceGeometry::new(0, 1080, 10.0);
        let err = build_timeline(&clip, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput(_)));
    }

    #[test]
    fn test_bad_transcript_fails_whole_clip() {
        let mut clip = clip_with_subject(5);
        clip.words.push(Word::new("oops", 2.0, 1.5));
        let err = build_timeline(&clip, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::MalformedTranscript { .. }));
    }

    #[test]
    fn test_process_batch_keeps_order() {
        let clips = vec![clip_with_subject(3), clip_with_subject(7), clip_with_subject(5)];
        let results = process_batch(&clips, &EngineConfig::default());

        let lengths: Vec<usize> = results
            .iter()
            .map(|r| r.as_ref().unwrap().crop_track.len())
            .collect();
        assert_eq!(lengths, vec![3, 7, 5]);
    }

    #[test]
    fn test_process_batch_invalid_config_fails_all() {
        let config = EngineConfig {
            max_words_per_line: 0,
            ..Default::default()
        };
        let results = process_batch(&[clip_with_subject(1), clip_with_subject(1)], &config);
        assert!(results.iter().all(|r| r.is_err()));
    }

    #[tokio::test]
    async fn test_run_with_deadline_completes() {
        let timeline = run_with_deadline(
            clip_with_subject(20),
            EngineConfig::default(),
            Duration::from_secs(30),
        )
        .await
        .unwrap();
        assert_eq!(timeline.crop_track.len(), 20);
    }

    #[test]
    fn test_run_with_deadline_from_sync_code() {
        let result = tokio_test::block_on(run_with_deadline(
            clip_with_subject(3),
            EngineConfig::default(),
            Duration::from_secs(30),
        ));
        assert_eq!(result.unwrap().crop_track.len(), 3);
    }

    #[tokio::test]
    async fn test_run_with_deadline_rejects_bad_config() {
        let config = EngineConfig {
            target_aspect_ratio: -1.0,
            ..Default::default()
        };
        let err = run_with_deadline(clip_with_subject(1), config, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
