//! Decision orchestrator
//!
//! Drives one tick end-to-end: generation bookkeeping, snapshot resolution,
//! optional grid build, and per-agent dispatch (parallel when the strategy
//! allows it). Always returns one decision per input agent in input order,
//! degrading to zeros instead of failing the tick.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::config::EngineConfig;
use crate::core::types::{Generation, Vec2};
use crate::engine::Steering;
use crate::snapshot::wire::{DecisionReply, SnapshotRequest};
use crate::snapshot::{Agent, WorldSnapshot};
use crate::spatial::SpatialGrid;

/// Owns the steering strategy and per-generation state.
pub struct FlockController {
    config: EngineConfig,
    strategy: Steering,
    last_generation: Option<Generation>,
    generation_time: Duration,
    generation_ticks: u64,
}

impl FlockController {
    pub fn new(config: EngineConfig) -> Self {
        let strategy = Steering::from_config(&config);
        Self {
            config,
            strategy,
            last_generation: None,
            generation_time: Duration::ZERO,
            generation_ticks: 0,
        }
    }

    /// Decision time accumulated over the current generation.
    pub fn generation_elapsed(&self) -> Duration {
        self.generation_time
    }

    /// Ticks processed in the current generation.
    pub fn generation_ticks(&self) -> u64 {
        self.generation_ticks
    }

    /// Process one tick: one `[vx, vy]` decision per input agent, in input
    /// order, all-zero on a malformed snapshot.
    pub fn make_decisions(&mut self, request: &SnapshotRequest) -> DecisionReply {
        self.roll_generation(request.generation);
        let started = Instant::now();

        let snapshot = match WorldSnapshot::from_request(request) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(generation = request.generation, error = %e, "degrading tick to zero decisions");
                return DecisionReply::new(
                    request.generation,
                    vec![Vec2::ZERO; request.birds.len()],
                );
            }
        };

        self.strategy.prepare_step();
        let grid = self
            .strategy
            .needs_grid()
            .then(|| snapshot.build_grid(self.config.grid_step));

        let active = snapshot.active_agents().count();
        let decisions = if self.strategy.is_parallel_safe() && active >= self.config.parallel_threshold
        {
            snapshot
                .agents
                .par_iter()
                .map(|agent| self.decide_one(&snapshot, grid.as_ref(), agent))
                .collect()
        } else {
            snapshot
                .agents
                .iter()
                .map(|agent| self.decide_one(&snapshot, grid.as_ref(), agent))
                .collect()
        };
        self.strategy.end_step();

        let elapsed = started.elapsed();
        self.generation_time += elapsed;
        self.generation_ticks += 1;
        debug!(
            generation = request.generation,
            agents = snapshot.agents.len(),
            active,
            elapsed_us = elapsed.as_micros() as u64,
            "tick complete"
        );

        DecisionReply::new(request.generation, decisions)
    }

    /// One agent's decision. Inactive agents get the zero vector without
    /// touching the strategy; a per-agent error degrades to zero and leaves
    /// the rest of the tick alone.
    fn decide_one(&self, snapshot: &WorldSnapshot, grid: Option<&SpatialGrid>, agent: &Agent) -> Vec2 {
        if !agent.active {
            return Vec2::ZERO;
        }
        match self.strategy.make_decision(snapshot, grid, agent) {
            Ok(velocity) => velocity,
            Err(e) => {
                warn!(agent = agent.id, error = %e, "zeroing decision for agent");
                Vec2::ZERO
            }
        }
    }

    /// Flush per-generation statistics when the incoming generation id
    /// differs from the last one seen.
    fn roll_generation(&mut self, generation: Generation) {
        if self.last_generation == Some(generation) {
            return;
        }
        if let Some(previous) = self.last_generation {
            info!(
                generation = previous,
                ticks = self.generation_ticks,
                total_ms = self.generation_time.as_millis() as u64,
                "generation complete"
            );
        }
        self.last_generation = Some(generation);
        self.generation_time = Duration::ZERO;
        self.generation_ticks = 0;
    }
}
