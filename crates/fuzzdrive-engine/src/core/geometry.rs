use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// A point in world coordinates.
///
/// World coordinates are continuous and use one unit per road map cell, so the point
/// `(x, y)` lies in cell `(floor(x), floor(y))`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the point reached by travelling `length` units along `heading`.
    #[must_use]
    pub fn advanced(self, heading: f32, length: f32) -> Self {
        let (sin, cos) = heading.sin_cos();
        Self::new(self.x + cos * length, self.y + sin * length)
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Position and heading of a vehicle.
///
/// The heading is in radians, measured counter-clockwise from the +x axis, and is kept
/// in `(-π, π]` by [`Pose::rotated`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub heading: f32,
}

impl Pose {
    #[must_use]
    pub const fn new(position: Point, heading: f32) -> Self {
        Self { position, heading }
    }

    /// Returns this pose turned by `delta` radians, with the heading wrapped.
    #[must_use]
    pub fn rotated(self, delta: f32) -> Self {
        Self {
            position: self.position,
            heading: wrap_angle(self.heading + delta),
        }
    }

    /// Returns this pose moved `length` units along its heading.
    #[must_use]
    pub fn advanced(self, length: f32) -> Self {
        Self {
            position: self.position.advanced(self.heading, length),
            heading: self.heading,
        }
    }
}

/// Wraps an angle into `(-π, π]`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
