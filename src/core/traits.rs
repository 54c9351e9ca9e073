//! Core traits for pluggable estimators

use crate::core::{Matrix, PredictionOutput, Result, RunnerError, Targets};

/// A learning estimator with a fit/predict contract
///
/// Probability output is an optional capability: the default implementation
/// reports [`RunnerError::CapabilityUnsupported`], which callers may recover
/// from by falling back to [`Estimator::predict`].
pub trait Estimator {
    /// Short identifier used in logs and model metadata
    fn name(&self) -> &str;

    /// Fit the estimator on a feature matrix and its targets
    fn fit(&mut self, features: &Matrix, targets: &Targets) -> Result<()>;

    /// Predict hard labels (classification) or values (regression)
    fn predict(&self, features: &Matrix) -> Result<PredictionOutput>;

    /// Predict class probabilities, one row per instance
    fn predict_probabilities(&self, features: &Matrix) -> Result<Matrix> {
        let _ = features;
        Err(RunnerError::CapabilityUnsupported {
            estimator: self.name().to_string(),
            capability: "probability prediction",
        })
    }

    /// Whether the estimator has been fitted
    fn is_fitted(&self) -> bool;
}
