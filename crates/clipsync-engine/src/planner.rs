//! Crop trajectory planning.
//!
//! Converts the per-frame active subject into one crop window per frame.
//! Every emitted window has exactly the target aspect ratio, lies inside the
//! source frame, and differs from the previous window by at most
//! `max_window_delta_per_frame`.
//!
//! Frames without a subject hold the previous window. Frames before the first
//! subject use the default window: as tall as the source allows, centered.

use clipsync_models::{CropWindow, Frame, FramedWindow, SourceGeometry, Subject};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::smoothing::{limit_window_delta, SubjectSignal, TrajectoryState};

/// Margin added around the subject on each side, as a fraction of its size.
pub const SUBJECT_PADDING: f64 = 0.15;

/// Smallest window height relative to the source height (3x zoom).
pub const MAX_ZOOM: f64 = 3.0;

/// Counters describing how a trajectory was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerStats {
    /// Frames emitted
    pub frames: usize,
    /// Frames that used the default window
    pub default_frames: usize,
    /// Frames that held the previous window
    pub held_frames: usize,
    /// Frames whose move was cut by the delta limit
    pub limited_frames: usize,
}

/// Planned crop windows with bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct CropTrajectory {
    pub windows: Vec<FramedWindow>,
    pub stats: PlannerStats,
}

/// Plans a smooth crop trajectory for one clip.
#[derive(Debug, Clone)]
pub struct CropTrajectoryPlanner {
    geometry: SourceGeometry,
    aspect: f64,
    alpha: f64,
    max_delta: f64,
}

impl CropTrajectoryPlanner {
    /// Create a planner for a source of the given geometry.
    pub fn new(config: &EngineConfig, geometry: &SourceGeometry) -> Self {
        Self {
            geometry: *geometry,
            aspect: config.target_aspect_ratio,
            alpha: config.smoothing_alpha,
            max_delta: config.max_window_delta_per_frame,
        }
    }

    /// Tallest window of the target aspect that fits the source.
    fn max_height(&self) -> f64 {
        self.geometry
            .height_f64()
            .min(self.geometry.width_f64() / self.aspect)
    }

    /// The window used before any subject has been seen.
    pub fn default_window(&self) -> CropWindow {
        self.window_for_signal(&SubjectSignal::whole_frame(&self.geometry))
    }

    /// Frame a subject signal: pad it, grow the short side to the target
    /// aspect, clamp the size to the source, then shift it inside the frame.
    ///
    /// When the padded subject is larger than the source allows the window
    /// is capped and the subject is partially cut.
    pub fn window_for_signal(&self, signal: &SubjectSignal) -> CropWindow {
        let frame_w = self.geometry.width_f64();
        let frame_h = self.geometry.height_f64();

        let padded_w = signal.width.max(0.0) * (1.0 + 2.0 * SUBJECT_PADDING);
        let padded_h = signal.height.max(0.0) * (1.0 + 2.0 * SUBJECT_PADDING);

        let max_h = self.max_height();
        let min_h = (frame_h / MAX_ZOOM).min(max_h);

        let height = padded_h.max(padded_w / self.aspect).clamp(min_h, max_h);
        let width = height * self.aspect;

        let x = (signal.cx - width / 2.0).min(frame_w - width).max(0.0);
        let y = (signal.cy - height / 2.0).min(frame_h - height).max(0.0);

        CropWindow::new(x, y, width, height)
    }

    /// Plan one window per frame.
    ///
    /// `subjects` must be aligned with `frames`; a length mismatch is a
    /// caller bug and reported as [`EngineError::Internal`].
    pub fn plan(
        &self,
        frames: &[Frame],
        subjects: &[Option<Subject>],
    ) -> EngineResult<CropTrajectory> {
        if frames.len() != subjects.len() {
            return Err(EngineError::internal(format!(
                "planner got {} frames but {} subject entries",
                frames.len(),
                subjects.len()
            )));
        }

        let mut stats = PlannerStats::default();
        let mut state: Option<TrajectoryState> = None;
        let mut windows = Vec::with_capacity(frames.len());

        for (frame, subject) in frames.iter().zip(subjects) {
            let next = match (subject, state) {
                (Some(subject), None) => {
                    let signal = SubjectSignal::from_subject(subject, &self.geometry);
                    TrajectoryState {
                        signal,
                        window: self.window_for_signal(&signal),
                    }
                }
                (Some(subject), Some(prev)) => {
                    let target = SubjectSignal::from_subject(subject, &self.geometry);
                    let signal = prev.signal.ema(&target, self.alpha);
                    let candidate = self.window_for_signal(&signal);
                    let (window, limited) =
                        limit_window_delta(&prev.window, &candidate, self.max_delta, &self.geometry);
                    if limited {
                        stats.limited_frames += 1;
                    }
                    TrajectoryState { signal, window }
                }
                (None, Some(prev)) => {
                    stats.held_frames += 1;
                    prev
                }
                (None, None) => {
                    stats.default_frames += 1;
                    let signal = SubjectSignal::whole_frame(&self.geometry);
                    TrajectoryState {
                        signal,
                        window: self.window_for_signal(&signal),
                    }
                }
            };

            windows.push(FramedWindow::new(*frame, next.window));
            state = Some(next);
        }

        stats.frames = windows.len();
        debug!(
            frames = stats.frames,
            default_frames = stats.default_frames,
            held_frames = stats.held_frames,
            limited_frames = stats.limited_frames,
            "Planned crop trajectory"
        );

        Ok(CropTrajectory { windows, stats })
    }
}
