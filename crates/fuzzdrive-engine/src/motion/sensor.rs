use std::{collections::HashMap, f32::consts::FRAC_PI_4};

use serde::{Deserialize, Serialize};

use crate::core::{
    geometry::{Point, Pose},
    road_map::RoadMap,
};

/// Clearance measured by the three probes, in world units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub left: f32,
    pub front: f32,
    pub right: f32,
}

impl SensorReadings {
    pub const BLIND: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(left: f32, front: f32, right: f32) -> Self {
        Self { left, front, right }
    }

    /// Readings clamped to `[0, max_range]`. Non-finite values become 0.
    #[must_use]
    pub fn clamped(self, max_range: f32) -> Self {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, max_range) } else { 0.0 };
        Self::new(clamp(self.left), clamp(self.front), clamp(self.right))
    }

    #[must_use]
    pub fn to_array(self) -> [f32; 3] {
        [self.left, self.front, self.right]
    }

    /// Absolute difference between the side clearances.
    #[must_use]
    pub fn imbalance(self) -> f32 {
        (self.left - self.right).abs()
    }
}

/// Ray-marching range sensor over a [`RoadMap`].
///
/// Three probes leave the vehicle at fixed offsets from its heading: `+π/4` (left),
/// `0` (front) and `-π/4` (right). Each probe advances `step` units at a time from the
/// vehicle position and reports the distance of the first sample that is not drivable, or
/// `max_range` when the whole range is clear.
///
/// Sensing works on the pose quantised to `position_resolution` and `heading_resolution`,
/// so readings are a pure function of the quantised pose. This is what lets
/// [`SensorMemo`] cache readings without changing any result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorModel {
    pub max_range: f32,
    pub step: f32,
    pub position_resolution: f32,
    pub heading_resolution: f32,
}

impl Default for SensorModel {
    fn default() -> Self {
        Self {
            max_range: 20.0,
            step: 0.5,
            position_resolution: 0.25,
            heading_resolution: 1.0_f32.to_radians(),
        }
    }
}

impl SensorModel {
    pub const PROBE_OFFSETS: [f32; 3] = [FRAC_PI_4, 0.0, -FRAC_PI_4];

    /// Measures the clearance around `pose`.
    #[must_use]
    pub fn sense(&self, pose: Pose, road_map: &RoadMap) -> SensorReadings {
        match self.quantize(pose) {
            Some(key) => self.sense_quantized(key, road_map),
            None => SensorReadings::BLIND,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn sense_quantized(&self, key: PoseKey, road_map: &RoadMap) -> SensorReadings {
        let origin = Point::new(
            key.x as f32 * self.position_resolution,
            key.y as f32 * self.position_resolution,
        );
        if !road_map.is_drivable(origin) {
            return SensorReadings::BLIND;
        }
        let heading = key.heading as f32 * self.heading_resolution;
        let [left, front, right] =
            Self::PROBE_OFFSETS.map(|offset| self.probe(origin, heading + offset, road_map));
        SensorReadings::new(left, front, right)
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn probe(&self, origin: Point, angle: f32, road_map: &RoadMap) -> f32 {
        let samples = (self.max_range / self.step).ceil();
        // a degenerate step samples the end of the range only
        let samples = if samples.is_finite() && samples >= 1.0 {
            samples.min(1.0e6) as u32
        } else {
            1
        };
        let step = self.max_range / samples as f32;
        for i in 1..=samples {
            let distance = i as f32 * step;
            if !road_map.is_drivable(origin.advanced(angle, distance)) {
                return distance;
            }
        }
        self.max_range
    }

    #[expect(clippy::cast_possible_truncation)]
    fn quantize(&self, pose: Pose) -> Option<PoseKey> {
        let q = |v: f32, res: f32| {
            let v = (v / res).round();
            // f32 -> i32 casts saturate; reject what would saturate
            (v.is_finite() && v.abs() < 1.0e9).then_some(v as i32)
        };
        Some(PoseKey {
            x: q(pose.position.x, self.position_resolution)?,
            y: q(pose.position.y, self.position_resolution)?,
            heading: q(pose.heading, self.heading_resolution)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoseKey {
    x: i32,
    y: i32,
    heading: i32,
}

/// Memoising wrapper around [`SensorModel`].
///
/// The memo borrows the road map it was built for, so cached readings can never be served
/// for a different or modified map. Dropping the memo is the only way to invalidate it.
#[derive(Debug)]
pub struct SensorMemo<'a> {
    model: SensorModel,
    road_map: &'a RoadMap,
    cache: HashMap<PoseKey, SensorReadings>,
    hits: u64,
}

impl<'a> SensorMemo<'a> {
    #[must_use]
    pub fn new(model: SensorModel, road_map: &'a RoadMap) -> Self {
        Self {
            model,
            road_map,
            cache: HashMap::new(),
            hits: 0,
        }
    }

    #[must_use]
    pub fn model(&self) -> &SensorModel {
        &self.model
    }

    #[must_use]
    pub fn road_map(&self) -> &'a RoadMap {
        self.road_map
    }

    /// Same result as [`SensorModel::sense`], served from the cache when possible.
    pub fn sense(&mut self, pose: Pose) -> SensorReadings {
        let Some(key) = self.model.quantize(pose) else {
            return SensorReadings::BLIND;
        };
        if let Some(readings) = self.cache.get(&key) {
            self.hits += 1;
            return *readings;
        }
        let readings = self.model.sense_quantized(key, self.road_map);
        self.cache.insert(key, readings);
        readings
    }

    /// Number of cached poses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
