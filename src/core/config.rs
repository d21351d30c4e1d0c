//! Engine configuration with documented constants
//!
//! All force-law coefficients are collected here with explanations of their
//! purpose. The engine itself holds no tunable globals; an external tuning
//! process can supply a full `ForceConfig` without touching engine code.

use serde::{Deserialize, Serialize};

use crate::core::error::{FlockError, Result};

/// One power-law force: `constant * mass_factor^mass_exponent /
/// distance^distance_exponent`, contributing nothing beyond `cutoff`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForceLaw {
    /// Exponent applied to the mass factor (pair product for agent-agent
    /// forces, the single agent's mass for obstacle/goal forces).
    pub mass_exponent: f32,
    /// Exponent of the distance denominator. Higher values localize the
    /// force more sharply.
    pub distance_exponent: f32,
    /// Overall strength multiplier.
    pub constant: f32,
    /// Maximum distance at which this force contributes at all.
    pub cutoff: f32,
}

impl ForceLaw {
    pub fn new(mass_exponent: f32, distance_exponent: f32, constant: f32, cutoff: f32) -> Self {
        Self { mass_exponent, distance_exponent, constant, cutoff }
    }
}

/// The five steering force laws.
///
/// Defaults have been tuned to produce stable flocking: separation dominates
/// at close range (high constant, low cutoff), cohesion is weak but reaches
/// further, and the goal pull has a large cutoff with a slightly negative
/// mass exponent so heavier agents are pulled less.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceConfig {
    /// Push away from nearby agents along the inter-agent delta.
    pub separation: ForceLaw,
    /// Pull toward nearby agents.
    pub cohesion: ForceLaw,
    /// Pull velocity direction toward neighbors' headings.
    pub alignment: ForceLaw,
    /// Extra exponent on the neighbor's speed in the alignment force, so
    /// faster neighbors steer the flock harder.
    pub alignment_speed_exponent: f32,
    /// Push away from the closest point on a wall boundary. Distance is
    /// measured shape-to-shape, not center-to-center.
    pub obstacle: ForceLaw,
    /// Pull toward the goal center.
    pub goal: ForceLaw,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            separation: ForceLaw::new(1.0, 1.0, 10.0, 5.0),
            cohesion: ForceLaw::new(1.0, 2.0, 1.0, 10.0),
            alignment: ForceLaw::new(1.0, 1.0, 3.0, 5.0),
            alignment_speed_exponent: 1.0,
            obstacle: ForceLaw::new(1.0, 2.0, 3.0, 10.0),
            goal: ForceLaw::new(-0.025, 1.0, 30.0, 40.0),
        }
    }
}

/// Which steering strategy drives the per-agent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Continuous force-field blend of the five laws.
    ForceField,
    /// Aim straight at the goal; useful as a baseline and as the
    /// no-path fallback.
    DirectLine,
    /// Discrete A* routing over the spatial grid, falling back to
    /// direct-line when no path exists.
    GridSearch,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub strategy: StrategyKind,
    pub forces: ForceConfig,
    /// Cell size of the spatial grid (world units). Smaller = finer routing
    /// at higher rasterization and search cost.
    pub grid_step: f32,
    /// Minimum active-agent count before decisions are dispatched on the
    /// rayon pool. Below this, thread overhead exceeds the benefit.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::ForceField,
            forces: ForceConfig::default(),
            grid_step: 0.5,
            parallel_threshold: 16,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, falling back to defaults for absent fields is
    /// deliberately not supported: a config file must be complete.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig =
            toml::from_str(&raw).map_err(|e| FlockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.grid_step <= 0.0 || !self.grid_step.is_finite() {
            return Err(FlockError::Config(format!(
                "grid_step must be positive and finite, got {}",
                self.grid_step
            )));
        }
        for (name, law) in [
            ("separation", &self.forces.separation),
            ("cohesion", &self.forces.cohesion),
            ("alignment", &self.forces.alignment),
            ("obstacle", &self.forces.obstacle),
            ("goal", &self.forces.goal),
        ] {
            if law.cutoff < 0.0 {
                return Err(FlockError::Config(format!(
                    "{name} cutoff must be non-negative, got {}",
                    law.cutoff
                )));
            }
            if !law.constant.is_finite() {
                return Err(FlockError::Config(format!("{name} constant is not finite")));
            }
        }
        Ok(())
    }
}
