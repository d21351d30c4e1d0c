//! Murmuration - Per-Tick Flocking Decision Engine

pub mod core;
pub mod engine;
pub mod flock;
pub mod geometry;
pub mod snapshot;
pub mod spatial;
pub mod transport;
