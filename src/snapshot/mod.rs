//! Immutable per-tick view of the world
//!
//! A [`WorldSnapshot`] is built fresh from each incoming request, validated
//! once, and never mutated afterwards. All derived geometry (agent and wall
//! polygons) is resolved here so the rest of the engine works with plain
//! shapes and never touches the wire types again.

pub mod wire;

use geo_types::Polygon;

use crate::core::error::{FlockError, Result};
use crate::core::types::{AgentId, Vec2};
use crate::geometry;
use crate::spatial::SpatialGrid;
use wire::SnapshotRequest;

/// One agent, fully resolved for this tick.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Desired magnitude of the output velocity.
    pub speed: f32,
    /// Exponent base in the force laws.
    pub mass: f32,
    /// Closed polygon footprint.
    pub shape: Polygon<f32>,
    /// Inactive agents receive the zero decision and are excluded as force
    /// sources.
    pub active: bool,
}

/// A static obstacle.
#[derive(Debug, Clone)]
pub struct Wall {
    pub shape: Polygon<f32>,
}

/// The goal region: a circle that attracts agents and terminates paths.
#[derive(Debug, Clone, Copy)]
pub struct Goal {
    pub position: Vec2,
    pub radius: f32,
}

/// Immutable world view for one tick.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub width: f32,
    pub height: f32,
    pub agents: Vec<Agent>,
    pub walls: Vec<Wall>,
    pub goal: Goal,
}

impl WorldSnapshot {
    /// Resolve and validate a wire request.
    ///
    /// Fails with [`FlockError::MalformedSnapshot`] on invalid geometry; the
    /// orchestrator then degrades the tick to all-zero decisions.
    pub fn from_request(request: &SnapshotRequest) -> Result<Self> {
        if !(request.room_width > 0.0 && request.room_height > 0.0)
            || !request.room_width.is_finite()
            || !request.room_height.is_finite()
        {
            return Err(FlockError::MalformedSnapshot(format!(
                "arena dimensions must be positive, got {}x{}",
                request.room_width, request.room_height
            )));
        }

        if !(request.goal_diameter >= 0.0) || !request.goal_diameter.is_finite() {
            return Err(FlockError::MalformedSnapshot(format!(
                "goal diameter must be non-negative, got {}",
                request.goal_diameter
            )));
        }
        let goal_position: Vec2 = request.goal_position.into();
        if !goal_position.is_finite() {
            return Err(FlockError::MalformedSnapshot("goal position is not finite".into()));
        }

        let mut walls = Vec::with_capacity(request.walls.len());
        for (i, corners) in request.walls.iter().enumerate() {
            let ring = corners.ring();
            if !geometry::is_simple_polygon(&ring) {
                return Err(FlockError::MalformedSnapshot(format!(
                    "wall {i} corners do not form a simple polygon"
                )));
            }
            walls.push(Wall { shape: geometry::polygon_from_points(&ring) });
        }

        let mut agents = Vec::with_capacity(request.birds.len());
        for (id, bird) in request.birds.iter().enumerate() {
            let position: Vec2 = bird.position.into();
            let velocity: Vec2 = bird.velocity.into();
            if !position.is_finite() || !velocity.is_finite() {
                return Err(FlockError::MalformedSnapshot(format!(
                    "agent {id} has non-finite position or velocity"
                )));
            }
            if !bird.speed.is_finite() || !bird.mass.is_finite() {
                return Err(FlockError::MalformedSnapshot(format!(
                    "agent {id} has non-finite speed or mass"
                )));
            }
            let ring = bird.rect_corners.ring();
            if !geometry::is_simple_polygon(&ring) {
                return Err(FlockError::MalformedSnapshot(format!(
                    "agent {id} corners do not form a simple polygon"
                )));
            }
            agents.push(Agent {
                id,
                position,
                velocity,
                speed: bird.speed,
                mass: bird.mass,
                shape: geometry::polygon_from_points(&ring),
                active: bird.active,
            });
        }

        Ok(Self {
            width: request.room_width,
            height: request.room_height,
            agents,
            walls,
            goal: Goal { position: goal_position, radius: request.goal_diameter / 2.0 },
        })
    }

    /// Rasterize this snapshot into a fresh spatial grid.
    pub fn build_grid(&self, step: f32) -> SpatialGrid {
        SpatialGrid::build(self, step)
    }

    /// Agents currently participating in the simulation.
    pub fn active_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.active)
    }
}
