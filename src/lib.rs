//! ARFF data loading and a fit/predict process protocol for AutoML orchestrators
//!
//! ARFF files (dense or sparse) are turned into numeric feature/target
//! matrices, handed to a pluggable estimator, and the resulting model and
//! predictions are written in the formats the orchestrator reads back.

pub mod api;
pub mod config;
pub mod core;
pub mod data;
pub mod driver;
pub mod estimator;
pub mod output;
pub mod persistence;
pub mod resources;

// Re-export main types for convenience
pub use crate::api::{Learner, PipelineInfo, TrainedPipeline};
pub use crate::config::{CliArgs, RunConfig, RunMode};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{ParsedDataset, Preprocessor, RawTable, TargetSelection};
pub use crate::driver::{Driver, DriverState, RunOutcome};
pub use crate::estimator::{EstimatorAdapter, EstimatorKind, EstimatorModel, EstimatorSpec};
pub use crate::persistence::{load_model, save_model, ModelMetadata, SavedModel};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
