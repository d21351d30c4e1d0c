pub mod config;
pub mod error;
pub mod types;

pub use config::{EngineConfig, ForceConfig, ForceLaw, StrategyKind};
pub use error::{FlockError, Result};
pub use types::{AgentId, Generation, Vec2};
