//! Estimator back-ends and the adapter that drives them
//!
//! Every back-end implements [`Estimator`]. [`EstimatorModel`] is the closed
//! set of back-ends a pipeline can persist; it is built from an
//! [`EstimatorSpec`].

pub mod adapter;
pub mod dummy;
pub mod knn;
pub mod linear;

pub use self::adapter::EstimatorAdapter;
pub use self::dummy::DummyEstimator;
pub use self::knn::KNearestNeighbors;
pub use self::linear::RidgeRegression;

use crate::core::{Estimator, Matrix, PredictionOutput, Result, RunnerError, Targets};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available back-ends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    #[default]
    Knn,
    Ridge,
    Dummy,
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorKind::Knn => write!(f, "knn"),
            EstimatorKind::Ridge => write!(f, "ridge"),
            EstimatorKind::Dummy => write!(f, "dummy"),
        }
    }
}

/// Back-end choice plus its hyper-parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimatorSpec {
    pub kind: EstimatorKind,
    /// Neighbour count for `knn`
    pub neighbors: usize,
    /// Regularization strength for `ridge`
    pub alpha: f64,
}

impl Default for EstimatorSpec {
    fn default() -> Self {
        Self {
            kind: EstimatorKind::Knn,
            neighbors: 5,
            alpha: 1.0,
        }
    }
}

impl EstimatorSpec {
    pub fn new(kind: EstimatorKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Create an unfitted estimator
    pub fn build(&self) -> EstimatorModel {
        match self.kind {
            EstimatorKind::Knn => {
                EstimatorModel::KNearestNeighbors(KNearestNeighbors::new(self.neighbors))
            }
            EstimatorKind::Ridge => EstimatorModel::Ridge(RidgeRegression::new(self.alpha)),
            EstimatorKind::Dummy => EstimatorModel::Dummy(DummyEstimator::new()),
        }
    }
}

/// Any of the built-in back-ends
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EstimatorModel {
    KNearestNeighbors(KNearestNeighbors),
    Ridge(RidgeRegression),
    Dummy(DummyEstimator),
}

impl EstimatorModel {
    fn inner(&self) -> &dyn Estimator {
        match self {
            EstimatorModel::KNearestNeighbors(e) => e,
            EstimatorModel::Ridge(e) => e,
            EstimatorModel::Dummy(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Estimator {
        match self {
            EstimatorModel::KNearestNeighbors(e) => e,
            EstimatorModel::Ridge(e) => e,
            EstimatorModel::Dummy(e) => e,
        }
    }
}

impl Estimator for EstimatorModel {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn fit(&mut self, features: &Matrix, targets: &Targets) -> Result<()> {
        self.inner_mut().fit(features, targets)
    }

    fn predict(&self, features: &Matrix) -> Result<PredictionOutput> {
        self.inner().predict(features)
    }

    fn predict_probabilities(&self, features: &Matrix) -> Result<Matrix> {
        self.inner().predict_probabilities(features)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }
}

/// Shared fit-time validation: non-empty input with one target per row
pub(crate) fn check_fit_input(features: &Matrix, targets: &Targets) -> Result<()> {
    if features.is_empty() {
        return Err(RunnerError::InvalidDataset(
            "cannot fit on an empty feature matrix".to_string(),
        ));
    }
    if targets.len() != features.rows() {
        return Err(RunnerError::DimensionMismatch {
            expected: features.rows(),
            actual: targets.len(),
        });
    }
    Ok(())
}

/// Predict-time validation of the feature width
pub(crate) fn check_width(features: &Matrix, expected: usize) -> Result<()> {
    if features.cols() != expected {
        return Err(RunnerError::DimensionMismatch {
            expected,
            actual: features.cols(),
        });
    }
    Ok(())
}
