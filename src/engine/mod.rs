//! Per-agent steering: force laws, the pairwise cache, and strategy
//! selection.

pub mod cache;
pub mod forces;
pub mod strategy;

pub use cache::PairwiseCache;
pub use forces::{ForceFieldEngine, MAX_FORCE};
pub use strategy::Steering;
