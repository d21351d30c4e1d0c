//! Continuous force-field steering
//!
//! Each decision sums five power-law contributions, normalizes the result
//! and rescales it to the agent's speed. Every force follows
//! `constant * mass_factor^mass_exponent / distance^distance_exponent`,
//! clamped to [`MAX_FORCE`], and contributes nothing beyond its cutoff.

use crate::core::config::{ForceConfig, ForceLaw};
use crate::core::error::{FlockError, Result};
use crate::core::types::Vec2;
use crate::engine::cache::PairwiseCache;
use crate::geometry;
use crate::snapshot::{Agent, WorldSnapshot};

/// Upper bound on any single force magnitude. Coincident positions produce
/// exactly this instead of a division by zero.
pub const MAX_FORCE: f32 = 1_000_000.0;

/// The force-field steering engine. Holds the force configuration and the
/// per-tick pairwise distance cache.
#[derive(Debug)]
pub struct ForceFieldEngine {
    config: ForceConfig,
    cache: PairwiseCache,
}

impl ForceFieldEngine {
    pub fn new(config: ForceConfig) -> Self {
        Self { config, cache: PairwiseCache::new() }
    }

    /// Reset per-tick state. Must run before the first decision of a tick.
    pub fn prepare_step(&self) {
        self.cache.clear();
    }

    /// Compute the desired velocity for one agent.
    ///
    /// Zero summed force yields the zero vector. A non-finite sum is an
    /// error scoped to this agent only.
    pub fn make_decision(&self, snapshot: &WorldSnapshot, agent: &Agent) -> Result<Vec2> {
        let mut force = Vec2::ZERO;
        force += self.separation(snapshot, agent);
        force += self.cohesion(snapshot, agent);
        force += self.alignment(snapshot, agent);
        force += self.obstacle(snapshot, agent);
        force += self.goal(snapshot, agent);

        if !force.is_finite() {
            return Err(FlockError::NonFiniteResult { agent: agent.id });
        }

        Ok(geometry::normalize_or_zero(force) * agent.speed)
    }

    fn pair_distance(&self, a: &Agent, b: &Agent) -> f32 {
        self.cache
            .distance(a.id, b.id, || a.position.distance(b.position))
    }

    /// Repulsion away from each nearby peer along the inter-agent delta.
    fn separation(&self, snapshot: &WorldSnapshot, agent: &Agent) -> Vec2 {
        let law = &self.config.separation;
        let mut force = Vec2::ZERO;
        for other in snapshot.active_agents().filter(|o| o.id != agent.id) {
            let dist = self.pair_distance(agent, other);
            if dist > law.cutoff {
                continue;
            }
            let away = geometry::normalize_or_zero(agent.position - other.position);
            force += away * magnitude(law, agent.mass * other.mass, dist);
        }
        force
    }

    /// Attraction toward each nearby peer.
    fn cohesion(&self, snapshot: &WorldSnapshot, agent: &Agent) -> Vec2 {
        let law = &self.config.cohesion;
        let mut force = Vec2::ZERO;
        for other in snapshot.active_agents().filter(|o| o.id != agent.id) {
            let dist = self.pair_distance(agent, other);
            if dist > law.cutoff {
                continue;
            }
            let toward = geometry::normalize_or_zero(other.position - agent.position);
            force += toward * magnitude(law, agent.mass * other.mass, dist);
        }
        force
    }

    /// Pull toward neighbors' headings, scaled by their speed so faster
    /// neighbors steer the flock harder. A stationary neighbor contributes
    /// nothing.
    fn alignment(&self, snapshot: &WorldSnapshot, agent: &Agent) -> Vec2 {
        let law = &self.config.alignment;
        let speed_exp = self.config.alignment_speed_exponent;
        let mut force = Vec2::ZERO;
        for other in snapshot.active_agents().filter(|o| o.id != agent.id) {
            let dist = self.pair_distance(agent, other);
            if dist > law.cutoff {
                continue;
            }
            let heading = geometry::normalize_or_zero(other.velocity);
            let speed_scale = other.velocity.length().powf(speed_exp);
            force += heading * (magnitude(law, agent.mass * other.mass, dist) * speed_scale);
        }
        force
    }

    /// Repulsion from each wall within cutoff of the agent's shape.
    ///
    /// Distance is measured shape-to-shape, but the direction points away
    /// from the closest point on the wall boundary to the agent's center.
    /// Walls have effectively infinite mass, so only the agent's own mass
    /// enters the law.
    fn obstacle(&self, snapshot: &WorldSnapshot, agent: &Agent) -> Vec2 {
        let law = &self.config.obstacle;
        let mut force = Vec2::ZERO;
        for wall in &snapshot.walls {
            let dist = geometry::polygon_distance(&agent.shape, &wall.shape);
            if dist > law.cutoff {
                continue;
            }
            let closest = geometry::closest_boundary_point(&wall.shape, agent.position);
            let away = geometry::normalize_or_zero(agent.position - closest);
            force += away * magnitude(law, agent.mass, dist);
        }
        force
    }

    /// Attraction toward the goal center. The slightly negative default
    /// mass exponent makes heavier agents less eager.
    fn goal(&self, snapshot: &WorldSnapshot, agent: &Agent) -> Vec2 {
        let law = &self.config.goal;
        let delta = snapshot.goal.position - agent.position;
        let dist = delta.length();
        if dist > law.cutoff {
            return Vec2::ZERO;
        }
        geometry::normalize_or_zero(delta) * magnitude(law, agent.mass, dist)
    }
}

/// Power-law magnitude, clamped to [`MAX_FORCE`]. Zero distance short-cuts
/// to the clamp rather than dividing by zero.
fn magnitude(law: &ForceLaw, mass_factor: f32, dist: f32) -> f32 {
    if dist == 0.0 {
        return MAX_FORCE;
    }
    let f = law.constant * mass_factor.powf(law.mass_exponent) / dist.powf(law.distance_exponent);
    // Not f32::min, which would turn a NaN force into the clamp value and
    // hide it from the non-finite check downstream
    if f > MAX_FORCE {
        MAX_FORCE
    } else {
        f
    }
}
