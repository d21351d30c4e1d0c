//! Wire schema for the simulator transport
//!
//! Field names mirror the simulator's JSON payloads exactly (camelCase).
//! These types stay dumb: all validation happens when a [`WorldSnapshot`]
//! is built from a request.
//!
//! [`WorldSnapshot`]: crate::snapshot::WorldSnapshot

use serde::{Deserialize, Serialize};

use crate::core::types::{Generation, Vec2};

/// An `{x, y}` pair as the simulator encodes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XY {
    pub x: f32,
    pub y: f32,
}

impl From<XY> for Vec2 {
    fn from(xy: XY) -> Self {
        Vec2::new(xy.x, xy.y)
    }
}

/// Four named corners of a rectangular footprint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectCorners {
    pub top_left: XY,
    pub top_right: XY,
    pub bottom_left: XY,
    pub bottom_right: XY,
}

impl RectCorners {
    /// Corners in ring order, so the resulting polygon is simple.
    pub fn ring(&self) -> [Vec2; 4] {
        [
            self.top_left.into(),
            self.top_right.into(),
            self.bottom_right.into(),
            self.bottom_left.into(),
        ]
    }
}

/// One agent as reported by the simulator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirdState {
    pub position: XY,
    pub velocity: XY,
    pub speed: f32,
    pub mass: f32,
    pub active: bool,
    pub rect_corners: RectCorners,
}

/// The per-tick world snapshot request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub generation: Generation,
    pub room_width: f32,
    pub room_height: f32,
    pub goal_position: XY,
    pub goal_diameter: f32,
    pub walls: Vec<RectCorners>,
    pub birds: Vec<BirdState>,
}

/// The outbound decision list, one `[vx, vy]` per input agent in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionReply {
    pub generation: Generation,
    pub decisions: Vec<[f32; 2]>,
}

impl DecisionReply {
    pub fn new(generation: Generation, velocities: Vec<Vec2>) -> Self {
        Self {
            generation,
            decisions: velocities.into_iter().map(|v| [v.x, v.y]).collect(),
        }
    }
}
