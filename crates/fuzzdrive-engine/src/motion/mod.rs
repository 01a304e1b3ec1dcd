//! Per-tick vehicle behaviour: kinematics and range sensing.
//!
//! - [`VehicleState`](vehicle::VehicleState) - pose plus latest readings, integrated by
//!   [`VehicleState::update`](vehicle::VehicleState::update)
//! - [`SensorModel`](sensor::SensorModel) - three ray-marching probes against a
//!   [`RoadMap`](crate::RoadMap)
//! - [`SensorMemo`](sensor::SensorMemo) - cache over quantised poses, bound to one map

pub mod sensor;
pub mod vehicle;
