//! Static world representation: geometry, the occupancy grid and tracks.

pub mod geometry;
pub mod raster;
pub mod road_map;
pub mod track;
