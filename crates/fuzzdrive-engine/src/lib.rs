//! World model for the fuzzy driving simulation.
//!
//! This crate holds everything the controller drives against, with no knowledge of
//! fuzzy logic or training:
//!
//! - [`RoadMap`] - immutable occupancy grid of drivable cells
//! - [`RoadMapBuilder`] - polygon rasterisation into a road map
//! - [`Track`] - road map plus start pose and goal, with built-in shapes
//! - [`VehicleState`] - kinematic state updated once per tick
//! - [`SensorModel`] / [`SensorMemo`] - left/front/right clearance probes
//!
//! # Example
//!
//! ```
//! use fuzzdrive_engine::{SensorModel, Track, VehicleState};
//!
//! let track = Track::sine();
//! let sensor = SensorModel::default();
//! let mut vehicle = VehicleState::new(track.start);
//!
//! vehicle.readings = sensor.sense(vehicle.pose, &track.road_map);
//! vehicle.update(0.1, 5.0, 0.0);
//! assert!(track.road_map.is_drivable(vehicle.position()));
//! ```

pub use self::{
    core::{geometry::*, raster::*, road_map::*, track::*},
    motion::{sensor::*, vehicle::*},
};

pub mod core;
pub mod motion;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RoadMapError {
    #[display("road map must have at least one row and one column")]
    EmptyMap,
    #[display("expected {expected} cells, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[display("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("invalid cell '{ch}' at row {row}, column {column}")]
    InvalidCell { row: usize, column: usize, ch: char },
}
