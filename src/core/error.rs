use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlockError {
    /// The incoming snapshot could not be turned into valid world geometry.
    /// The tick degrades to all-zero decisions; processing continues.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Normalization of the zero vector was requested. Callers recover by
    /// substituting the zero vector; this must never surface as NaN.
    #[error("cannot normalize a zero-magnitude vector")]
    ZeroMagnitude,

    /// A force or velocity computation produced NaN/Inf for one agent.
    /// Only that agent's decision degrades to zero.
    #[error("non-finite steering result for agent {agent}")]
    NonFiniteResult { agent: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlockError>;
