use serde::{Deserialize, Serialize};

use super::sensor::SensorReadings;
use crate::core::geometry::{Point, Pose};

/// State of one simulated vehicle.
///
/// Owned by exactly one simulation run and advanced once per tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub pose: Pose,
    /// Most recent sensor readings, refreshed by the simulation before each decision.
    pub readings: SensorReadings,
}

impl VehicleState {
    #[must_use]
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            readings: SensorReadings::default(),
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.pose.position
    }

    #[must_use]
    pub fn heading(&self) -> f32 {
        self.pose.heading
    }

    /// Integrates one tick of motion.
    ///
    /// The heading turns by `rotation` first; the vehicle then travels `speed * dt` along
    /// the new heading. Returns the length of the step.
    pub fn update(&mut self, dt: f32, speed: f32, rotation: f32) -> f32 {
        let length = speed * dt;
        self.pose = self.pose.rotated(rotation).advanced(length);
        length.abs()
    }
}
