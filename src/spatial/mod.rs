//! Spatial reasoning: the per-tick cell grid and path search over it.

pub mod grid;
pub mod pathfinding;

pub use grid::{Cell, CellMarker, SpatialGrid};
pub use pathfinding::find_path;
