//! Steering strategies
//!
//! A capability-tagged variant rather than a trait object: the orchestrator
//! queries `needs_grid` and `is_parallel_safe` up front and dispatches
//! accordingly. The active variant is selected by configuration.

use tracing::trace;

use crate::core::config::{EngineConfig, StrategyKind};
use crate::core::error::Result;
use crate::core::types::Vec2;
use crate::engine::forces::ForceFieldEngine;
use crate::geometry;
use crate::snapshot::{Agent, WorldSnapshot};
use crate::spatial::{self, SpatialGrid};

/// The per-agent steering strategy.
#[derive(Debug)]
pub enum Steering {
    /// Continuous blend of the five force laws.
    ForceField(ForceFieldEngine),
    /// Aim straight at the goal.
    DirectLine,
    /// A* over the spatial grid, aiming at the first waypoint off the
    /// current cell; falls back to direct-line when no path exists.
    GridSearch,
}

impl Steering {
    pub fn from_config(config: &EngineConfig) -> Self {
        match config.strategy {
            StrategyKind::ForceField => {
                Steering::ForceField(ForceFieldEngine::new(config.forces.clone()))
            }
            StrategyKind::DirectLine => Steering::DirectLine,
            StrategyKind::GridSearch => Steering::GridSearch,
        }
    }

    /// Whether the orchestrator must rasterize the grid this tick.
    pub fn needs_grid(&self) -> bool {
        matches!(self, Steering::GridSearch)
    }

    /// Whether per-agent decisions may run on the worker pool. Grid search
    /// is kept sequential: each search walks a large shared frontier and
    /// gains little from parallel dispatch.
    pub fn is_parallel_safe(&self) -> bool {
        match self {
            Steering::ForceField(_) | Steering::DirectLine => true,
            Steering::GridSearch => false,
        }
    }

    /// Reset per-tick state before the first decision of a tick.
    pub fn prepare_step(&self) {
        if let Steering::ForceField(engine) = self {
            engine.prepare_step();
        }
    }

    /// Hook after the last decision of a tick.
    pub fn end_step(&self) {}

    pub fn make_decision(
        &self,
        snapshot: &WorldSnapshot,
        grid: Option<&SpatialGrid>,
        agent: &Agent,
    ) -> Result<Vec2> {
        match self {
            Steering::ForceField(engine) => engine.make_decision(snapshot, agent),
            Steering::DirectLine => Ok(direct_line(snapshot, agent)),
            Steering::GridSearch => Ok(grid_search(snapshot, grid, agent)),
        }
    }
}

fn direct_line(snapshot: &WorldSnapshot, agent: &Agent) -> Vec2 {
    let delta = snapshot.goal.position - agent.position;
    geometry::normalize_or_zero(delta) * agent.speed
}

fn grid_search(snapshot: &WorldSnapshot, grid: Option<&SpatialGrid>, agent: &Agent) -> Vec2 {
    let Some(grid) = grid else {
        return direct_line(snapshot, agent);
    };
    let start = grid.world_to_cell(agent.position);
    let goal = grid.world_to_cell(snapshot.goal.position);

    match spatial::find_path(grid, agent, start, goal) {
        Some(path) => {
            // Aim at the first waypoint off the current cell; a path of
            // length one means we are already there
            match path.iter().find(|&&cell| cell != start) {
                Some(&waypoint) => {
                    let aim = grid.cell_to_world(waypoint) - agent.position;
                    geometry::normalize_or_zero(aim) * agent.speed
                }
                None => direct_line(snapshot, agent),
            }
        }
        None => {
            trace!(agent = agent.id, "no path to goal, steering directly");
            direct_line(snapshot, agent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::wire::{BirdState, RectCorners, SnapshotRequest, XY};

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

    fn world(walls: Vec<RectCorners>, agent_at: Vec2, goal: XY) -> WorldSnapshot {
        let request = SnapshotRequest {
            generation: 0,
            room_width: 20.0,
            room_height: 20.0,
            goal_position: goal,
            goal_diameter: 1.0,
            walls,
            birds: vec![BirdState {
                position: xy(agent_at.x, agent_at.y),
                velocity: xy(0.0, 0.0),
                speed: 2.0,
                mass: 1.0,
                active: true,
                rect_corners: square_corners(agent_at.x, agent_at.y, 0.4),
            }],
        };
        WorldSnapshot::from_request(&request).unwrap()
    }

    fn angle_between(a: Vec2, b: Vec2) -> f32 {
        let cos = a.dot(b) / (a.length() * b.length());
        cos.clamp(-1.0, 1.0).acos()
    }

    #[test]
    fn test_capability_flags() {
        let ff = Steering::from_config(&EngineConfig::default());
        assert!(!ff.needs_grid());
        assert!(ff.is_parallel_safe());

        let mut config = EngineConfig::default();
        config.strategy = StrategyKind::GridSearch;
        let gs = Steering::from_config(&config);
        assert!(gs.needs_grid());
        assert!(!gs.is_parallel_safe());
    }

    #[test]
    fn test_direct_line_aims_at_goal() {
        let snapshot = world(vec![], Vec2::new(3.0, 10.0), xy(17.0, 10.0));
        let decision = Steering::DirectLine
            .make_decision(&snapshot, None, &snapshot.agents[0])
            .unwrap();
        assert!((decision.x - 2.0).abs() < 1e-5);
        assert!(decision.y.abs() < 1e-5);
    }

    #[test]
    fn test_grid_search_deviates_around_blocking_wall() {
        // Wall fully blocking the direct line, close enough that stepping
        // straight at the goal is excluded by the footprint check; the aim
        // must leave the straight-line direction by a real angle
        let snapshot = world(
            vec![square_corners(10.0, 12.0, 4.0)],
            Vec2::new(5.0, 12.0),
            xy(17.0, 12.0),
        );
        let grid = snapshot.build_grid(0.5);
        let agent = &snapshot.agents[0];
        let decision = Steering::GridSearch
            .make_decision(&snapshot, Some(&grid), agent)
            .unwrap();
        let direct = snapshot.goal.position - agent.position;
        assert!((decision.length() - 2.0).abs() < 1e-4);
        assert!(
            angle_between(decision, direct) > 0.1,
            "aim should deviate from line of sight, got {decision:?}"
        );
    }

    #[test]
    fn test_grid_search_falls_back_when_enclosed() {
        let snapshot = world(
            vec![
                square_corners(5.0, 8.0, 3.0),
                square_corners(5.0, 16.0, 3.0),
                square_corners(1.0, 12.0, 3.0),
                square_corners(9.0, 12.0, 3.0),
            ],
            Vec2::new(5.0, 12.0),
            xy(17.0, 10.0),
        );
        let grid = snapshot.build_grid(0.5);
        let agent = &snapshot.agents[0];
        let decision = Steering::GridSearch
            .make_decision(&snapshot, Some(&grid), agent)
            .unwrap();
        let direct = Steering::DirectLine
            .make_decision(&snapshot, None, agent)
            .unwrap();
        assert_eq!(decision, direct);
    }
}
