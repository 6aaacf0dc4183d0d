//! Small 2D helpers used by perception, the controller and motion.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const TAU: f32 = 2.0 * PI;

/// Continuous position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Heading from `self` towards `other`.
    #[inline]
    pub fn heading_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

/// Wrap an angle into `(-π, π]`.
///
/// `wrap_angle(-π)` yields `π`, so the result is unique for every direction.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Convert a world-space vector into `(heading relative to orientation / π, magnitude / √2 in [0, 1])`.
#[inline]
pub fn angle_and_magnitude(x: f32, y: f32, orientation: f32) -> (f32, f32) {
    let angle = wrap_angle(y.atan2(x) - orientation) / PI;
    let magnitude = (x.hypot(y) / std::f32::consts::SQRT_2).clamp(0.0, 1.0);
    (angle, magnitude)
}
