//! Temporal smoothing for the crop trajectory.
//!
//! The trajectory is an explicit fold over frames carrying one small state
//! record: the smoothed subject signal and the last emitted window. Two
//! mechanisms keep motion smooth:
//! 1. An exponential moving average on the subject signal
//! 2. A hard cap on how far the window may move or resize in one frame

use clipsync_models::{CropWindow, SourceGeometry, Subject};

/// Subject center and size in source pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectSignal {
    /// Center x-coordinate
    pub cx: f64,
    /// Center y-coordinate
    pub cy: f64,
    /// Subject width
    pub width: f64,
    /// Subject height
    pub height: f64,
}

impl SubjectSignal {
    /// Create a new signal.
    pub fn new(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            cx,
            cy,
            width,
            height,
        }
    }

    /// Scale a normalized subject to source pixels.
    pub fn from_subject(subject: &Subject, geometry: &SourceGeometry) -> Self {
        let w = geometry.width_f64();
        let h = geometry.height_f64();
        Self::new(subject.cx * w, subject.cy * h, subject.width * w, subject.height * h)
    }

    /// The whole frame treated as the subject: centered and full size.
    pub fn whole_frame(geometry: &SourceGeometry) -> Self {
        let w = geometry.width_f64();
        let h = geometry.height_f64();
        Self::new(w / 2.0, h / 2.0, w, h)
    }

    /// One EMA step toward `target`, each component independently.
    pub fn ema(&self, target: &SubjectSignal, alpha: f64) -> SubjectSignal {
        SubjectSignal {
            cx: self.cx + alpha * (target.cx - self.cx),
            cy: self.cy + alpha * (target.cy - self.cy),
            width: self.width + alpha * (target.width - self.width),
            height: self.height + alpha * (target.height - self.height),
        }
    }
}

/// State carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryState {
    /// Smoothed subject signal
    pub signal: SubjectSignal,
    /// Last emitted window
    pub window: CropWindow,
}

/// Limit the change from `prev` to `next` so that the center moves at most
/// `max_delta` (Euclidean, in normalized frame units) and the height changes
/// at most `max_delta` of the frame height.
///
/// The result is `prev + t * (next - prev)` for a single `t` in `[0, 1]`.
/// Both endpoints share the same aspect ratio and lie inside the frame, so
/// the blend does too.
pub fn limit_window_delta(
    prev: &CropWindow,
    next: &CropWindow,
    max_delta: f64,
    geometry: &SourceGeometry,
) -> (CropWindow, bool) {
    let w = geometry.width_f64();
    let h = geometry.height_f64();

    let dx = (next.cx() - prev.cx()) / w;
    let dy = (next.cy() - prev.cy()) / h;
    let center_move = (dx * dx + dy * dy).sqrt();
    let size_move = (next.height - prev.height).abs() / h;

    let mut t: f64 = 1.0;
    if center_move > max_delta {
        t = t.min(max_delta / center_move);
    }
    if size_move > max_delta {
        t = t.min(max_delta / size_move);
    }

    if t >= 1.0 {
        (*next, false)
    } else {
        (CropWindow::lerp(prev, next, t), true)
    }
}

/// Center displacement between two windows in normalized frame units.
pub fn center_displacement(a: &CropWindow, b: &CropWindow, geometry: &SourceGeometry) -> f64 {
    let dx = (b.cx() - a.cx()) / geometry.width_f64();
    let dy = (b.cy() - a.cy()) / geometry.height_f64();
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> SourceGeometry {
        SourceGeometry::hd_1080p(10.0)
    }

    #[test]
    fn test_ema_moves_fraction_of_gap() {
        let a = SubjectSignal::new(0.0, 0.0, 100.0, 100.0);
        let b = SubjectSignal::new(100.0, 50.0, 200.0, 100.0);
        let s = a.ema(&b, 0.25);
        assert_eq!(s.cx, 25.0);
        assert_eq!(s.cy, 12.5);
        assert_eq!(s.width, 125.0);
        assert_eq!(s.height, 100.0);
    }

    #[test]
    fn test_ema_alpha_one_snaps() {
        let a = SubjectSignal::new(0.0, 0.0, 100.0, 100.0);
        let b = SubjectSignal::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(a.ema(&b, 1.0), b);
    }

    #[test]
    fn test_limit_caps_large_move() {
        let g = geometry();
        let prev = CropWindow::new(0.0, 0.0, 607.5, 1080.0);
        let next = CropWindow::new(1000.0, 0.0, 607.5, 1080.0);

        let (limited, was_limited) = limit_window_delta(&prev, &next, 0.04, &g);
        assert!(was_limited);
        let moved = center_displacement(&prev, &limited, &g);
        assert!((moved - 0.04).abs() < 1e-12);
        assert!((limited.aspect() - 0.5625).abs() < 1e-12);
    }

    #[test]
    fn test_limit_passes_small_move() {
        let g = geometry();
        let prev = CropWindow::new(100.0, 0.0, 607.5, 1080.0);
        let next = CropWindow::new(110.0, 0.0, 607.5, 1080.0);

        let (limited, was_limited) = limit_window_delta(&prev, &next, 0.04, &g);
        assert!(!was_limited);
        assert_eq!(limited, next);
    }

    #[test]
    fn test_limit_caps_resize() {
        let g = geometry();
        let prev = CropWindow::from_center(960.0, 540.0, 202.5, 360.0);
        let next = CropWindow::from_center(960.0, 540.0, 607.5, 1080.0);

        let (limited, _) = limit_window_delta(&prev, &next, 0.04, &g);
        assert!(((limited.height - prev.height) / 1080.0 - 0.04).abs() < 1e-12);
    }
}
