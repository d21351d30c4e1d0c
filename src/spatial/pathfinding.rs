//! A* path search over the spatial grid
//!
//! 8-connected expansion with a Manhattan heuristic. A cell is enterable
//! only if its marker is open, goal, or the searching agent itself, and the
//! agent's whole footprint (inflated by one grid step) would also sit on
//! enterable cells there. The footprint check is what keeps the agent's body
//! from being routed through a wall when only its center point would clear
//! it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use crate::geometry;
use crate::snapshot::Agent;
use crate::spatial::grid::{Cell, CellMarker, SpatialGrid};

/// Node in the A* open set
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    cell: Cell,
    f_cost: OrderedFloat<f32>, // g_cost + heuristic
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.cell.cmp(&other.cell))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path from `start` to `goal` for `agent`.
///
/// Returns `None` when the frontier empties without reaching the goal; the
/// caller falls back to direct goal-seeking, this is not an error.
pub fn find_path(
    grid: &SpatialGrid,
    agent: &Agent,
    start: Cell,
    goal: Cell,
) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
    let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();
    let mut closed: AHashSet<Cell> = AHashSet::new();

    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        cell: start,
        f_cost: OrderedFloat(manhattan(start, goal)),
    });

    while let Some(current) = open_set.pop() {
        if current.cell == goal || grid.get(current.cell) == Some(CellMarker::Goal) {
            return Some(reconstruct_path(&came_from, current.cell));
        }
        if !closed.insert(current.cell) {
            continue;
        }

        let current_g = *g_scores.get(&current.cell).unwrap_or(&f32::INFINITY);

        for neighbor in neighbors(current.cell) {
            if closed.contains(&neighbor) {
                continue;
            }
            if !cell_enterable(grid, agent, neighbor) {
                closed.insert(neighbor);
                continue;
            }
            if !footprint_clear(grid, agent, neighbor) {
                closed.insert(neighbor);
                continue;
            }

            let tentative_g = current_g + step_cost(current.cell, neighbor);
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.cell);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    cell: neighbor,
                    f_cost: OrderedFloat(tentative_g + manhattan(neighbor, goal)),
                });
            }
        }
    }

    None // No path found
}

/// 8-connected neighborhood.
fn neighbors(cell: Cell) -> impl Iterator<Item = Cell> {
    let (x, y) = cell;
    (-1..=1)
        .flat_map(move |dx| (-1..=1).map(move |dy| (x + dx, y + dy)))
        .filter(move |&c| c != cell)
}

/// Whether the cell may be entered by this agent: open, goal, or the
/// agent's own footprint marks. Out-of-bounds and wall cells block.
fn cell_enterable(grid: &SpatialGrid, agent: &Agent, cell: Cell) -> bool {
    match grid.get(cell) {
        Some(CellMarker::Open) | Some(CellMarker::Goal) => true,
        Some(CellMarker::Agent(id)) => id == agent.id,
        _ => false,
    }
}

/// Swept-footprint check: translate the agent's polygon so its center sits
/// at `cell`, inflate by one grid step, and require every boundary-contour
/// cell to be enterable. Contour cells off the grid fail the check.
fn footprint_clear(grid: &SpatialGrid, agent: &Agent, cell: Cell) -> bool {
    let offset = grid.cell_to_world(cell) - agent.position;
    let swept = geometry::inflate(&geometry::translate(&agent.shape, offset), grid.step);
    grid.contour_cells(&swept)
        .into_iter()
        .all(|c| cell_enterable(grid, agent, c))
}

fn manhattan(a: Cell, b: Cell) -> f32 {
    ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as f32
}

fn step_cost(a: Cell, b: Cell) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dy = (a.1 - b.1) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &AHashMap<Cell, Cell>, mut current: Cell) -> Vec<Cell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
