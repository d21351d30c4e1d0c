//! Uniform cell grid over the arena
//!
//! Shape boundaries are rasterized into discrete cells; interiors are left
//! open on purpose, trading fidelity for sampling cost. The grid is built
//! fresh each tick and is read-only afterwards, so workers share it without
//! synchronization.

use geo_types::Polygon;

use crate::core::types::{AgentId, Vec2};
use crate::geometry;
use crate::snapshot::WorldSnapshot;

/// Number of segments used to polygonize the goal circle before
/// rasterization.
const GOAL_RING_SEGMENTS: usize = 32;

/// What occupies a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMarker {
    #[default]
    Open,
    Wall,
    Goal,
    Agent(AgentId),
}

/// Integer cell coordinates. May be out of bounds; `get` returns `None` for
/// those.
pub type Cell = (i32, i32);

/// 2D grid of cell markers with cell size `step`.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    pub width: usize,
    pub height: usize,
    pub step: f32,
    cells: Vec<CellMarker>,
}

impl SpatialGrid {
    /// Rasterize a snapshot. Mark order is Goal, then Walls, then active
    /// Agents; later marks win on overlapping cells, so an agent pressed
    /// against a wall keeps its identity near the obstacle.
    pub fn build(snapshot: &WorldSnapshot, step: f32) -> Self {
        let width = (snapshot.width / step).ceil() as usize;
        let height = (snapshot.height / step).ceil() as usize;
        let mut grid = Self {
            width,
            height,
            step,
            cells: vec![CellMarker::default(); width * height],
        };

        let goal_ring = geometry::circle_polygon(
            snapshot.goal.position,
            snapshot.goal.radius,
            GOAL_RING_SEGMENTS,
        );
        grid.mark_boundary(&goal_ring, CellMarker::Goal);

        for wall in &snapshot.walls {
            grid.mark_boundary(&wall.shape, CellMarker::Wall);
        }

        for agent in snapshot.active_agents() {
            grid.mark_boundary(&agent.shape, CellMarker::Agent(agent.id));
        }

        grid
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<CellMarker> {
        let (x, y) = cell;
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.cells[y as usize * self.width + x as usize])
    }

    #[inline]
    fn set(&mut self, cell: Cell, marker: CellMarker) {
        let (x, y) = cell;
        // Out-of-bounds samples are silently skipped, not an error
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.cells[y as usize * self.width + x as usize] = marker;
    }

    /// Convert a world position to cell coordinates (floor truncation).
    #[inline]
    pub fn world_to_cell(&self, p: Vec2) -> Cell {
        ((p.x / self.step).floor() as i32, (p.y / self.step).floor() as i32)
    }

    /// Convert cell coordinates back to a world position (cell origin).
    #[inline]
    pub fn cell_to_world(&self, cell: Cell) -> Vec2 {
        Vec2::new(cell.0 as f32 * self.step, cell.1 as f32 * self.step)
    }

    /// Mark every cell touched by the polygon's exterior ring.
    ///
    /// Each edge is sampled `max(|dx|, |dy|) / step` times (at least once);
    /// the edge endpoint is covered by the next edge's start.
    fn mark_boundary(&mut self, shape: &Polygon<f32>, marker: CellMarker) {
        for cell in self.contour_cells(shape) {
            self.set(cell, marker);
        }
    }

    /// Cells touched by the polygon's exterior ring, including any that fall
    /// outside the grid.
    pub fn contour_cells(&self, shape: &Polygon<f32>) -> Vec<Cell> {
        let mut seen = ahash::AHashSet::new();
        let mut cells = Vec::new();
        let ring = &shape.exterior().0;
        for edge in ring.windows(2) {
            let (p1, p2) = (edge[0], edge[1]);
            let dx = p2.x - p1.x;
            let dy = p2.y - p1.y;
            let samples = (dx.abs().max(dy.abs()) / self.step).max(1.0);
            let n = samples as usize;
            for s in 0..=n {
                let t = s as f32 / samples;
                let p = Vec2::new(p1.x + dx * t, p1.y + dy * t);
                let cell = self.world_to_cell(p);
                if seen.insert(cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::wire::{BirdState, RectCorners, SnapshotRequest, XY};
    use proptest::prelude::*;

    fn xy(x: f32, y: f32) -> XY {
        XY { x, y }
    }

    fn square_corners(cx: f32, cy: f32, half: f32) -> RectCorners {
        RectCorners {
            top_left: xy(cx - half, cy + half),
            top_right: xy(cx + half, cy + half),
            bottom_left: xy(cx - half, cy - half),
            bottom_right: xy(cx + half, cy - half),
        }
    }

    fn snapshot_with(walls: Vec<RectCorners>, birds: Vec<BirdState>) -> WorldSnapshot {
        let request = SnapshotRequest {
            generation: 0,
            room_width: 20.0,
            room_height: 20.0,
            goal_position: xy(18.0, 18.0),
            goal_diameter: 1.0,
            walls,
            birds,
        };
        WorldSnapshot::from_request(&request).unwrap()
    }

    fn bird(cx: f32, cy: f32, active: bool) -> BirdState {
        BirdState {
            position: xy(cx, cy),
            velocity: xy(0.0, 0.0),
            speed: 1.0,
            mass: 1.0,
            active,
            rect_corners: square_corners(cx, cy, 0.5),
        }
    }

    #[test]
    fn test_dimensions_round_up() {
        let snapshot = snapshot_with(vec![], vec![]);
        let grid = snapshot.build_grid(0.6);
        assert_eq!(grid.width, (20.0f32 / 0.6).ceil() as usize);
        assert_eq!(grid.height, (20.0f32 / 0.6).ceil() as usize);
    }

    #[test]
    fn test_wall_boundary_marked_interior_open() {
        let snapshot = snapshot_with(vec![square_corners(10.0, 10.0, 3.0)], vec![]);
        let grid = snapshot.build_grid(0.5);

        // Perimeter cell of the wall
        let edge = grid.world_to_cell(Vec2::new(7.0, 10.0));
        assert_eq!(grid.get(edge), Some(CellMarker::Wall));

        // Interior stays open by design
        let inside = grid.world_to_cell(Vec2::new(10.0, 10.0));
        assert_eq!(grid.get(inside), Some(CellMarker::Open));
    }

    #[test]
    fn test_inactive_agent_not_marked() {
        let snapshot = snapshot_with(vec![], vec![bird(5.0, 5.0, false)]);
        let grid = snapshot.build_grid(0.5);
        let cell = grid.world_to_cell(Vec2::new(4.5, 5.0));
        assert_eq!(grid.get(cell), Some(CellMarker::Open));
    }

    #[test]
    fn test_agent_overwrites_wall_marker() {
        // Agent footprint overlapping a wall edge: agents are marked last,
        // so the shared cell carries the agent id (documented policy)
        let snapshot = snapshot_with(
            vec![square_corners(5.0, 5.0, 1.0)],
            vec![bird(4.0, 5.0, true)],
        );
        let grid = snapshot.build_grid(0.5);
        let shared = grid.world_to_cell(Vec2::new(4.0, 4.5));
        assert_eq!(grid.get(shared), Some(CellMarker::Agent(0)));
    }

    #[test]
    fn test_goal_ring_marked() {
        let snapshot = snapshot_with(vec![], vec![]);
        let grid = snapshot.build_grid(0.5);
        let on_ring = grid.world_to_cell(Vec2::new(18.5, 18.0));
        assert_eq!(grid.get(on_ring), Some(CellMarker::Goal));
    }

    #[test]
    fn test_out_of_bounds_get() {
        let snapshot = snapshot_with(vec![], vec![]);
        let grid = snapshot.build_grid(0.5);
        assert_eq!(grid.get((-1, 0)), None);
        assert_eq!(grid.get((0, grid.height as i32)), None);
    }

    proptest! {
        #[test]
        fn prop_cell_round_trip_within_one_step(
            x in 0.0f32..20.0,
            y in 0.0f32..20.0,
            step in 0.1f32..2.0,
        ) {
            let snapshot = snapshot_with(vec![], vec![]);
            let grid = SpatialGrid::build(&snapshot, step);
            let p = Vec2::new(x, y);
            let back = grid.cell_to_world(grid.world_to_cell(p));
            prop_assert!((back.x - p.x).abs() <= step + 1e-4);
            prop_assert!((back.y - p.y).abs() <= step + 1e-4);
        }
    }
}
