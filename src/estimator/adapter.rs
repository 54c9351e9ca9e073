//! Uniform fit/predict surface over an [`Estimator`]

use crate::core::{Estimator, Matrix, PredictionOutput, Result, RunnerError};
use crate::data::ParsedDataset;
use crate::estimator::EstimatorModel;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Wraps an estimator and applies the probability fallback rule
///
/// When probabilities are requested and the estimator reports
/// [`RunnerError::CapabilityUnsupported`], hard predictions are returned
/// instead. Any other failure is propagated unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimatorAdapter<E: Estimator = EstimatorModel> {
    estimator: E,
}

impl<E: Estimator> EstimatorAdapter<E> {
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }

    /// Fit on the numeric view of a training table
    pub fn fit(&mut self, dataset: &ParsedDataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(RunnerError::insufficient_data("training data has no rows"));
        }
        info!(
            "Fitting {} on {} rows x {} features",
            self.estimator.name(),
            dataset.len(),
            dataset.features.cols()
        );
        self.estimator
            .fit(&dataset.features, &dataset.estimator_targets())
    }

    /// Predict, preferring probabilities when `probabilities` is set
    pub fn predict(&self, features: &Matrix, probabilities: bool) -> Result<PredictionOutput> {
        if !self.estimator.is_fitted() {
            return Err(RunnerError::ModelNotTrained);
        }

        if probabilities {
            match self.estimator.predict_probabilities(features) {
                Ok(p) => {
                    debug!("Predicted probabilities for {} rows", p.rows());
                    return Ok(PredictionOutput::Probabilities(p));
                }
                Err(RunnerError::CapabilityUnsupported {
                    estimator,
                    capability,
                }) => {
                    warn!(
                        "{} does not support {}, falling back to hard predictions",
                        estimator, capability
                    );
                }
                Err(e) => return Err(e),
            }
        }

        self.estimator.predict(features)
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Matrix, Targets};

    /// Records fit calls and fails probability prediction on demand
    struct Scripted {
        fitted: bool,
        probability_error: Option<fn() -> RunnerError>,
    }

    impl Estimator for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fit(&mut self, _features: &Matrix, _targets: &Targets) -> Result<()> {
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, features: &Matrix) -> Result<PredictionOutput> {
            Ok(PredictionOutput::Labels(vec![1; features.rows()]))
        }

        fn predict_probabilities(&self, features: &Matrix) -> Result<Matrix> {
            match self.probability_error {
                Some(make) => Err(make()),
                None => Ok(Matrix::zeros(features.rows(), 2)),
            }
        }

        fn is_fitted(&self) -> bool {
            self.fitted
        }
    }

    fn dataset() -> ParsedDataset {
        ParsedDataset {
            features: Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap(),
            targets: Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap(),
            feature_attributes: Vec::new(),
            target_attributes: Vec::new(),
            class_indices: Some(vec![0, 1]),
            imputed_cells: 0,
        }
    }

    fn fitted(probability_error: Option<fn() -> RunnerError>) -> EstimatorAdapter<Scripted> {
        let mut adapter = EstimatorAdapter::new(Scripted {
            fitted: false,
            probability_error,
        });
        adapter.fit(&dataset()).unwrap();
        adapter
    }

    #[test]
    fn test_probabilities_when_supported() {
        let adapter = fitted(None);
        let out = adapter.predict(&Matrix::zeros(3, 1), true).unwrap();
        assert!(matches!(out, PredictionOutput::Probabilities(ref m) if m.rows() == 3));
    }

    #[test]
    fn test_fallback_on_unsupported_capability() {
        let adapter = fitted(Some(|| RunnerError::CapabilityUnsupported {
            estimator: "scripted".to_string(),
            capability: "probability prediction",
        }));
        let out = adapter.predict(&Matrix::zeros(2, 1), true).unwrap();
        assert_eq!(out, PredictionOutput::Labels(vec![1, 1]));
    }

    #[test]
    fn test_other_errors_propagate() {
        let adapter = fitted(Some(|| RunnerError::Numerical("overflow".to_string())));
        assert!(matches!(
            adapter.predict(&Matrix::zeros(2, 1), true),
            Err(RunnerError::Numerical(_))
        ));
    }

    #[test]
    fn test_labels_only_skips_probabilities() {
        let adapter = fitted(None);
        let out = adapter.predict(&Matrix::zeros(1, 1), false).unwrap();
        assert_eq!(out, PredictionOutput::Labels(vec![1]));
    }

    #[test]
    fn test_unfitted_and_empty() {
        let adapter = EstimatorAdapter::new(Scripted {
            fitted: false,
            probability_error: None,
        });
        assert!(matches!(
            adapter.predict(&Matrix::zeros(1, 1), true),
            Err(RunnerError::ModelNotTrained)
        ));

        let mut adapter = adapter;
        let mut empty = dataset();
        empty.features = Matrix::zeros(0, 1);
        assert!(matches!(adapter.fit(&empty), Err(RunnerError::Parse(_))));
    }
}
