//! Crop windows in source pixel space.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::Frame;

/// Crop window in source pixel space.
///
/// Coordinates stay fractional so the aspect ratio is exact; use
/// [`CropWindow::to_even_pixels`] when an encoder needs integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropWindow {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Crop width
    pub width: f64,
    /// Crop height
    pub height: f64,
}

impl CropWindow {
    /// Create a new crop window.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a window of the given size centered on `(cx, cy)`.
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }

    /// Whether the window lies inside a `width` x `height` frame, allowing
    /// `tolerance` pixels of floating-point slack.
    pub fn fits_within(&self, width: f64, height: f64, tolerance: f64) -> bool {
        self.x >= -tolerance
            && self.y >= -tolerance
            && self.x2() <= width + tolerance
            && self.y2() <= height + tolerance
    }

    /// Linear interpolation between two crop windows.
    pub fn lerp(a: &CropWindow, b: &CropWindow, t: f64) -> CropWindow {
        CropWindow {
            x: a.x + t * (b.x - a.x),
            y: a.y + t * (b.y - a.y),
            width: a.width + t * (b.width - a.width),
            height: a.height + t * (b.height - a.height),
        }
    }

    /// Round to integer pixels with even dimensions (required by many codecs),
    /// keeping the result inside a `frame_width` x `frame_height` source.
    pub fn to_even_pixels(&self, frame_width: u32, frame_height: u32) -> PixelCrop {
        let max_w = (frame_width as i32 / 2) * 2;
        let max_h = (frame_height as i32 / 2) * 2;

        let width = (((self.width.round() as i32) / 2) * 2).clamp(2.min(max_w), max_w.max(2));
        let height = (((self.height.round() as i32) / 2) * 2).clamp(2.min(max_h), max_h.max(2));

        let x = (self.x.round() as i32).min(frame_width as i32 - width).max(0);
        let y = (self.y.round() as i32).min(frame_height as i32 - height).max(0);

        PixelCrop {
            x,
            y,
            width,
            height,
        }
    }
}

/// Integer crop rectangle for FFmpeg-style `crop=w:h:x:y` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelCrop {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A crop window bound to the frame it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FramedWindow {
    pub frame: Frame,
    pub window: CropWindow,
}

impl FramedWindow {
    /// Pair a frame with its window.
    pub fn new(frame: Frame, window: CropWindow) -> Self {
        Self { frame, window }
    }

    /// Timestamp of the frame.
    #[inline]
    pub fn time(&self) -> f64 {
        self.frame.timestamp
    }
}
