//! Band geometry in the label's un-rotated coordinate space.
//!
//! Everything here is a pure function of the angle, the distance from the
//! corner, the band thickness and the corner side; text content never
//! influences the bounding box.

use crate::config::Corner;
use serde::Serialize;
use tracing::debug;

/// Angle used when a requested angle reduces to zero or below.
pub const FALLBACK_ANGLE: f32 = 30.0;

/// Reduces `degrees` modulo 90. Results outside (0, 90) become [`FALLBACK_ANGLE`].
pub fn normalize_angle(degrees: f32) -> f32 {
    let reduced = degrees % 90.0;
    if reduced > 0.0 {
        reduced
    } else {
        debug!(requested = degrees, fallback = FALLBACK_ANGLE, "angle out of range");
        FALLBACK_ANGLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// Float rectangle for draw primitives that may reach past the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rotation {
    /// Signed degrees, positive is clockwise in y-down coordinates.
    pub degrees: f32,
    pub pivot_x: f32,
    pub pivot_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Geometry {
    pub bounding_width: i32,
    pub bounding_height: i32,
    /// Height of the band's own box, before any minimum size is applied.
    pub band_height: i32,
    pub pivot_offset: f32,
    pub interior: Rect,
    pub rotation: Rotation,
}

impl Geometry {
    /// Grows the box to at least `min_width` x `min_height`. A top-right band
    /// stays anchored to the right edge, so its pivot and interior move with it.
    pub fn with_minimum(mut self, corner: Corner, min_width: u32, min_height: u32) -> Self {
        let min_width = i32::try_from(min_width).unwrap_or(i32::MAX);
        let min_height = i32::try_from(min_height).unwrap_or(i32::MAX);
        if min_width > self.bounding_width {
            if corner == Corner::TopRight {
                let dx = min_width - self.bounding_width;
                self.interior.left += dx;
                self.interior.right += dx;
                self.rotation.pivot_x = min_width as f32;
            }
            self.bounding_width = min_width;
        }
        self.bounding_height = self.bounding_height.max(min_height);
        self
    }
}

/// Rounds to whole pixels, saturating into `0..=i32::MAX`. NaN becomes 0.
fn to_px(value: f64) -> i64 {
    value.round().clamp(0.0, f64::from(i32::MAX)) as i64
}

fn clamp_to(value: i64, max: i64) -> i32 {
    value.clamp(0, max) as i32
}

pub fn solve(
    angle_degrees: f32,
    distance: u32,
    thickness: u32,
    corner: Corner,
    padding_top: u32,
    padding_bottom: u32,
) -> Geometry {
    let radians = f64::from(angle_degrees).to_radians();
    let (sin, cos, tan) = (radians.sin(), radians.cos(), radians.tan());
    let thickness_f = f64::from(thickness);

    let h1 = f64::from(distance) / cos;
    let h2 = thickness_f / cos;
    let pivot_offset = h1 + h2;
    let height = to_px(pivot_offset);
    let width = to_px(height as f64 / sin);

    // Float to int casts saturate, so a near-vertical tan cannot wrap.
    let along = (thickness_f * tan).round() as i64;
    let across = (thickness_f / tan).round() as i64;
    let (left, right) = match corner {
        Corner::TopLeft => (along, width.saturating_sub(across)),
        Corner::TopRight => (across, width.saturating_sub(along)),
    };
    let top = height - i64::from(thickness) + i64::from(padding_top);
    let bottom = height - i64::from(padding_bottom);

    let interior = Rect::new(
        clamp_to(left, width),
        clamp_to(top, height),
        clamp_to(right, width),
        clamp_to(bottom, height),
    );
    let (width, height) = (width as i32, height as i32);
    let rotation = match corner {
        Corner::TopLeft => Rotation {
            degrees: -angle_degrees,
            pivot_x: 0.0,
            pivot_y: pivot_offset as f32,
        },
        Corner::TopRight => Rotation {
            degrees: angle_degrees,
            pivot_x: width as f32,
            pivot_y: pivot_offset as f32,
        },
    };

    debug!(
        angle = angle_degrees,
        distance,
        thickness,
        %corner,
        width,
        height,
        ?interior,
        "solved band geometry"
    );

    Geometry {
        bounding_width: width,
        bounding_height: height,
        band_height: height,
        pivot_offset: pivot_offset as f32,
        interior,
        rotation,
    }
}

/// A size request from a parent layout. The label sizes itself and ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeConstraint {
    Exactly(u32),
    AtMost(u32),
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MeasuredSize {
    pub width: u32,
    pub height: u32,
}

/// The self-measured size is the bounding box; parent constraints are ignored.
pub fn measure(geometry: &Geometry, _width: SizeConstraint, _height: SizeConstraint) -> MeasuredSize {
    MeasuredSize {
        width: geometry.bounding_width.max(0) as u32,
        height: geometry.bounding_height.max(0) as u32,
    }
}
