//! Geometry primitives shared by detection, tracking and cropping.
//!
//! Detector boxes live in normalized `[0, 1]` frame coordinates; crop
//! windows live in source pixel space. `SourceGeometry` is the bridge.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bounding box in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a normalized box from pixel-space corners `(x1, y1)`-`(x2, y2)`.
    ///
    /// Corners may come in any order. Returns `None` when the frame size is
    /// degenerate or a coordinate is not finite.
    pub fn from_pixel_corners(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return None;
        }

        let w = frame_width as f64;
        let h = frame_height as f64;
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));

        Some(Self {
            x: left / w,
            y: top / h,
            width: (right - left) / w,
            height: (bottom - top) / h,
        })
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

    /// Box area as a fraction of the frame.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// All four components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Clip the box to the unit square.
    ///
    /// Edges outside `[0, 1]` are cut off rather than translated, so a box
    /// hanging off the frame shrinks to its visible part. Negative sizes
    /// collapse to zero.
    pub fn clamp_unit(&self) -> BoundingBox {
        if self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x2() <= 1.0
            && self.y2() <= 1.0
        {
            return *self;
        }

        let left = self.x.clamp(0.0, 1.0);
        let top = self.y.clamp(0.0, 1.0);
        let right = self.x2().clamp(0.0, 1.0).max(left);
        let bottom = self.y2().clamp(0.0, 1.0).max(top);

        BoundingBox {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Euclidean distance from the box center to the frame center.
    pub fn distance_from_center(&self) -> f64 {
        let dx = self.cx() - 0.5;
        let dy = self.cy() - 0.5;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Target aspect ratio for output video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AspectRatio {
    /// Width component
    pub width: u32,
    /// Height component
    pub height: u32,
}

impl AspectRatio {
    /// Portrait 9:16 (TikTok, Reels, Shorts)
    pub const PORTRAIT: AspectRatio = AspectRatio { width: 9, height: 16 };

    /// Square 1:1
    pub const SQUARE: AspectRatio = AspectRatio { width: 1, height: 1 };

    /// Instagram portrait 4:5
    pub const INSTAGRAM_PORTRAIT: AspectRatio = AspectRatio { width: 4, height: 5 };

    /// Create a new aspect ratio.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns width/height as float.
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 2 {
            return Err(AspectRatioParseError::InvalidFormat(s.to_string()));
        }

        let width = parts[0]
            .trim()
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(parts[0].to_string()))?;
        let height = parts[1]
            .trim()
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(parts[1].to_string()))?;

        if width == 0 || height == 0 {
            return Err(AspectRatioParseError::ZeroValue);
        }

        Ok(AspectRatio { width, height })
    }
}

#[derive(Debug, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio format: {0}, expected 'W:H'")]
    InvalidFormat(String),
    #[error("Invalid number in aspect ratio: {0}")]
    InvalidNumber(String),
    #[error("Aspect ratio cannot have zero values")]
    ZeroValue,
}

/// Pixel dimensions and sampling rate of the source video for one clip.
///
/// These are facts about the clip, not tuning knobs, so they travel with the
/// clip input rather than with the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceGeometry {
    /// Source frame width in pixels
    pub width: u32,
    /// Source frame height in pixels
    pub height: u32,
    /// Detector sampling rate in frames per second
    pub fps: f64,
}

impl SourceGeometry {
    /// Create a new source geometry.
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }

    /// Landscape 1080p sampled at the given rate.
    pub fn hd_1080p(fps: f64) -> Self {
        Self::new(1920, 1080, fps)
    }

    /// Source width as float.
    #[inline]
    pub fn width_f64(&self) -> f64 {
        self.width as f64
    }

    /// Source height as float.
    #[inline]
    pub fn height_f64(&self) -> f64 {
        self.height as f64
    }

    /// Seconds between two consecutive sampled frames, if the rate is usable.
    pub fn frame_interval(&self) -> Option<f64> {
        if self.fps.is_finite() && self.fps > 0.0 {
            Some(1.0 / self.fps)
        } else {
            None
        }
    }
}
