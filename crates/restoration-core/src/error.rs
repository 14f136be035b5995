use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestoreError {
    #[error("node `{0}` is already registered")]
    DuplicateNode(String),

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("self-loop on node `{0}` is not a valid dependency")]
    SelfLoop(String),

    #[error("invalid node `{name}`: {reason}")]
    InvalidNode { name: String, reason: String },

    #[error("available resources must be > 0, got {0}")]
    InvalidResourceBudget(usize),

    #[error("step count must be > 0, got {0}")]
    InvalidStepCount(usize),

    #[error("{name} must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("repair delay range [{low}, {high}) must be non-empty and positive")]
    InvalidDelayRange { low: f64, high: f64 },
}

pub type Result<T> = std::result::Result<T, RestoreError>;
