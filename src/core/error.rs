//! Error types for the ARFF runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Estimator '{estimator}' does not support {capability}")]
    CapabilityUnsupported {
        estimator: String,
        capability: &'static str,
    },

    #[error("Resource limit error: {0}")]
    ResourceLimit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Numerical error: {0}")]
    Numerical(String),
}

impl RunnerError {
    /// Process exit code reported to the orchestrator for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::Argument(_) => 2,
            RunnerError::Parse(_) => 3,
            RunnerError::Io(_) => 4,
            _ => 1,
        }
    }

    /// Shorthand for the "insufficient data" parse failure
    pub fn insufficient_data(context: impl std::fmt::Display) -> Self {
        RunnerError::Parse(format!("insufficient data: {context}"))
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
