//! The render timeline: crop track, cues and the merged instruction stream.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crop::{CropWindow, FramedWindow};
use crate::cue::Cue;

/// One instruction for the external compositor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderInstruction {
    /// Set the crop window from `time` onward.
    SetCrop {
        time: f64,
        frame_index: u64,
        window: CropWindow,
    },
    /// Put cue `cue_index` on screen.
    ShowCue { time: f64, cue_index: usize },
    /// Take cue `cue_index` off screen.
    HideCue { time: f64, cue_index: usize },
}

impl RenderInstruction {
    /// Time at which the instruction takes effect.
    pub fn time(&self) -> f64 {
        match self {
            Self::SetCrop { time, .. } | Self::ShowCue { time, .. } | Self::HideCue { time, .. } => {
                *time
            }
        }
    }

    /// Cue the instruction refers to, `None` for crops.
    pub fn cue_index(&self) -> Option<usize> {
        match self {
            Self::SetCrop { .. } => None,
            Self::ShowCue { cue_index, .. } | Self::HideCue { cue_index, .. } => Some(*cue_index),
        }
    }

    /// Order within one cue at a shared timestamp: a cue is shown before it
    /// is hidden, so a zero-length cue still appears.
    pub fn rank(&self) -> u8 {
        match self {
            Self::SetCrop { .. } => 0,
            Self::ShowCue { .. } => 1,
            Self::HideCue { .. } => 2,
        }
    }

    /// Whether this is a crop instruction.
    pub fn is_crop(&self) -> bool {
        matches!(self, Self::SetCrop { .. })
    }
}

/// Complete engine output for one clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    /// One crop window per sampled frame, ordered by time
    pub crop_track: Vec<FramedWindow>,
    /// Caption cues ordered by time
    pub cues: Vec<Cue>,
    /// Crop and cue instructions merged in non-decreasing time order
    pub instructions: Vec<RenderInstruction>,
}

impl Timeline {
    /// Span from the first crop frame or cue to the last one, in seconds.
    pub fn duration(&self) -> f64 {
        let starts = self
            .crop_track
            .first()
            .map(|fw| fw.time())
            .into_iter()
            .chain(self.cues.first().map(|c| c.start));
        let ends = self
            .crop_track
            .last()
            .map(|fw| fw.time())
            .into_iter()
            .chain(self.cues.last().map(|c| c.end));

        let start = starts.fold(f64::INFINITY, f64::min);
        let end = ends.fold(f64::NEG_INFINITY, f64::max);
        if start.is_finite() && end.is_finite() {
            (end - start).max(0.0)
        } else {
            0.0
        }
    }

    /// Crop window in effect at `time`.
    ///
    /// Each window holds until the next frame; before the first frame the
    /// first window applies and after the last frame the last one holds.
    pub fn window_at(&self, time: f64) -> Option<CropWindow> {
        let first = self.crop_track.first()?;
        let idx = self.crop_track.partition_point(|fw| fw.time() <= time);
        if idx == 0 {
            Some(first.window)
        } else {
            Some(self.crop_track[idx - 1].window)
        }
    }

    /// Crop window at `time`, blending linearly between neighbouring frames.
    pub fn interpolated_window_at(&self, time: f64) -> Option<CropWindow> {
        let first = self.crop_track.first()?;
        let last = self.crop_track.last()?;

        if time <= first.time() {
            return Some(first.window);
        }
        if time >= last.time() {
            return Some(last.window);
        }

        let idx = self.crop_track.partition_point(|fw| fw.time() <= time);
        let a = &self.crop_track[idx - 1];
        let b = &self.crop_track[idx];
        let span = b.time() - a.time();
        if span <= 0.0 {
            return Some(a.window);
        }
        let t = (time - a.time()) / span;
        Some(CropWindow::lerp(&a.window, &b.window, t))
    }

    /// Cue on screen at `time`, if any.
    pub fn active_cue_at(&self, time: f64) -> Option<&Cue> {
        let idx = self.cues.partition_point(|c| c.start <= time);
        if idx == 0 {
            return None;
        }
        let cue = &self.cues[idx - 1];
        cue.is_active_at(time).then_some(cue)
    }

    /// Whether the crop track barely moves (under 5% of the average width on
    /// every axis), letting a renderer fall back to a single static crop.
    pub fn is_static_crop(&self) -> bool {
        if self.crop_track.len() <= 1 {
            return true;
        }

        let range = |f: fn(&CropWindow) -> f64| {
            let (lo, hi) = self
                .crop_track
                .iter()
                .map(|fw| f(&fw.window))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            hi - lo
        };

        let avg_width = self.crop_track.iter().map(|fw| fw.window.width).sum::<f64>()
            / self.crop_track.len() as f64;
        let threshold = avg_width * 0.05;

        range(|w| w.x) < threshold && range(|w| w.y) < threshold && range(|w| w.width) < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Frame;

    fn track(xs: &[f64]) -> Vec<FramedWindow> {
        xs.iter()
            .enumerate()
            .map(|(i, &x)| {
                FramedWindow::new(
                    Frame::new(i as u64, i as f64 * 0.5),
                    CropWindow::new(x, 0.0, 600.0, 1080.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_window_at_holds_between_frames() {
        let timeline = Timeline {
            crop_track: track(&[0.0, 100.0, 200.0]),
            ..Default::default()
        };

        assert_eq!(timeline.window_at(-1.0).unwrap().x, 0.0);
        assert_eq!(timeline.window_at(0.49).unwrap().x, 0.0);
        assert_eq!(timeline.window_at(0.5).unwrap().x, 100.0);
        assert_eq!(timeline.window_at(99.0).unwrap().x, 200.0);
        assert!(Timeline::default().window_at(0.0).is_none());
    }

    #[test]
    fn test_interpolated_window_at() {
        let timeline = Timeline {
            crop_track: track(&[0.0, 100.0]),
            ..Default::default()
        };
        let mid = timeline.interpolated_window_at(0.25).unwrap();
        assert!((mid.x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_static_crop_detection() {
        let still = Timeline {
            crop_track: track(&[100.0, 102.0, 101.0]),
            ..Default::default()
        };
        assert!(still.is_static_crop());

        let moving = Timeline {
            crop_track: track(&[100.0, 300.0, 500.0]),
            ..Default::default()
        };
        assert!(!moving.is_static_crop());
    }

    #[test]
    fn test_instruction_serializes_with_tag() {
        let json = serde_json::to_value(RenderInstruction::ShowCue {
            time: 1.5,
            cue_index: 2,
        })
        .unwrap();
        assert_eq!(json["type"], "show_cue");
        assert_eq!(json["cue_index"], 2);
    }
}
