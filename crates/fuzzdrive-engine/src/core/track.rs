use std::f32::consts::{FRAC_PI_8, PI, TAU};

use serde::{Deserialize, Serialize};

use super::{
    geometry::{Point, Pose},
    raster::RoadMapBuilder,
    road_map::RoadMap,
};

/// Built-in track shapes.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum TrackKind {
    /// Sinusoidal corridor from the left edge to the right edge.
    #[default]
    #[display("sine")]
    Sine,
    /// Closed octagonal ring; the goal sits half a lap from the start.
    #[display("ring")]
    Ring,
}

/// A road map together with the vehicle start pose and the goal.
///
/// The start pose and goal are fixed inputs to every evaluation on this track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub road_map: RoadMap,
    pub start: Pose,
    pub goal: Point,
}

impl Track {
    #[must_use]
    pub fn new(road_map: RoadMap, start: Pose, goal: Point) -> Self {
        Self {
            road_map,
            start,
            goal,
        }
    }

    #[must_use]
    pub fn builtin(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Sine => Self::sine(),
            TrackKind::Ring => Self::ring(),
        }
    }

    /// Sinusoidal corridor, 160×60 cells, 10 cells wide.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn sine() -> Self {
        const WIDTH: usize = 160;
        const HEIGHT: usize = 60;
        const AMPLITUDE: f32 = 12.0;
        const PERIOD: f32 = 80.0;
        const HALF_WIDTH: f32 = 5.0;

        let center = |x: f32| HEIGHT as f32 / 2.0 + AMPLITUDE * (TAU * x / PERIOD).sin();
        let xs = (0..=WIDTH).map(|x| x as f32);
        let upper = xs.clone().map(|x| Point::new(x, center(x) - HALF_WIDTH));
        let lower = xs.rev().map(|x| Point::new(x, center(x) + HALF_WIDTH));
        let polygon = upper.chain(lower).collect::<Vec<_>>();

        let road_map = RoadMapBuilder::new(WIDTH, HEIGHT)
            .expect("track dimensions are non-zero")
            .fill_polygon(&polygon, true)
            .build();

        let start_x = 3.0;
        let slope = AMPLITUDE * TAU / PERIOD * (TAU * start_x / PERIOD).cos();
        let start = Pose::new(Point::new(start_x, center(start_x)), slope.atan());
        let goal_x = WIDTH as f32 - 3.0;
        Self::new(road_map, start, Point::new(goal_x, center(goal_x)))
    }

    /// Octagonal ring, 100×100 cells, roughly 15 cells wide.
    #[must_use]
    pub fn ring() -> Self {
        const SIZE: usize = 100;
        const OUTER_RADIUS: f32 = 46.0;
        const INNER_RADIUS: f32 = 30.0;
        let center = Point::new(50.0, 50.0);

        let octagon = |radius: f32| {
            (0..8_u8)
                .map(|i| center.advanced(FRAC_PI_8 + f32::from(i) * PI / 4.0, radius))
                .collect::<Vec<_>>()
        };
        let outer = octagon(OUTER_RADIUS);
        let inner = octagon(INNER_RADIUS);

        let road_map = RoadMapBuilder::new(SIZE, SIZE)
            .expect("track dimensions are non-zero")
            .alternating(&[&outer, &inner])
            .build();

        let lane = (OUTER_RADIUS + INNER_RADIUS) / 2.0 * FRAC_PI_8.cos();
        let start = Pose::new(Point::new(center.x, center.y + lane), 0.0);
        let goal = Point::new(center.x, center.y - lane);
        Self::new(road_map, start, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tracks_start_on_road() {
        for kind in [TrackKind::Sine, TrackKind::Ring] {
            let track = Track::builtin(kind);
            assert!(track.road_map.is_drivable(track.start.position), "{kind}");
            assert!(track.road_map.is_drivable(track.goal), "{kind}");
            assert!(track.start.position.distance(track.goal) > 50.0, "{kind}");
        }
    }

    #[test]
    fn test_ring_has_hole() {
        let track = Track::ring();
        assert!(!track.road_map.is_drivable(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_track_kind_from_str() {
        assert_eq!("sine".parse::<TrackKind>().unwrap(), TrackKind::Sine);
        assert_eq!("ring".parse::<TrackKind>().unwrap(), TrackKind::Ring);
        assert!("oval".parse::<TrackKind>().is_err());
    }
}
