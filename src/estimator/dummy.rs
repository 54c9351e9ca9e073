//! Baseline estimator that ignores the features

use crate::core::{Estimator, Matrix, PredictionOutput, Result, RunnerError, Targets};
use crate::estimator::knn::argmax;
use crate::estimator::{check_fit_input, check_width};
use serde::{Deserialize, Serialize};

/// Predicts the most frequent class (with class priors as probabilities) or
/// the per-target training mean
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DummyEstimator {
    state: Option<DummyState>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct DummyState {
    n_features: usize,
    summary: Summary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Summary {
    Priors(Vec<f64>),
    Means(Vec<f64>),
}

impl DummyEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, features: &Matrix) -> Result<&DummyState> {
        let state = self.state.as_ref().ok_or(RunnerError::ModelNotTrained)?;
        check_width(features, state.n_features)?;
        Ok(state)
    }
}

fn repeat_row(row: &[f64], times: usize) -> Matrix {
    let mut out = Matrix::zeros(times, row.len());
    for r in 0..times {
        for (c, &v) in row.iter().enumerate() {
            out.set(r, c, v);
        }
    }
    out
}

impl Estimator for DummyEstimator {
    fn name(&self) -> &str {
        "dummy"
    }

    fn fit(&mut self, features: &Matrix, targets: &Targets) -> Result<()> {
        check_fit_input(features, targets)?;
        let n = targets.len() as f64;
        let summary = match targets {
            Targets::Classes { indices, n_classes } => {
                let mut priors = vec![0.0; *n_classes];
                for &class in indices {
                    priors[class] += 1.0;
                }
                priors.iter_mut().for_each(|p| *p /= n);
                Summary::Priors(priors)
            }
            Targets::Values(values) => Summary::Means(
                (0..values.cols())
                    .map(|c| values.column(c).iter().sum::<f64>() / n)
                    .collect(),
            ),
        };
        self.state = Some(DummyState {
            n_features: features.cols(),
            summary,
        });
        Ok(())
    }

    fn predict(&self, features: &Matrix) -> Result<PredictionOutput> {
        match &self.state(features)?.summary {
            Summary::Priors(priors) => Ok(PredictionOutput::Labels(vec![
                argmax(priors);
                features.rows()
            ])),
            Summary::Means(means) => Ok(PredictionOutput::Values(repeat_row(
                means,
                features.rows(),
            ))),
        }
    }

    fn predict_probabilities(&self, features: &Matrix) -> Result<Matrix> {
        match &self.state(features)?.summary {
            Summary::Priors(priors) => Ok(repeat_row(priors, features.rows())),
            Summary::Means(_) => Err(RunnerError::CapabilityUnsupported {
                estimator: self.name().to_string(),
                capability: "probability prediction for regression targets",
            }),
        }
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_class_priors() {
        let features = Matrix::zeros(4, 1);
        let targets = Targets::Classes {
            indices: vec![1, 2, 1, 0],
            n_classes: 3,
        };
        let mut dummy = DummyEstimator::new();
        dummy.fit(&features, &targets).unwrap();

        assert_eq!(
            dummy.predict(&Matrix::zeros(2, 1)).unwrap(),
            PredictionOutput::Labels(vec![1, 1])
        );
        let probabilities = dummy.predict_probabilities(&Matrix::zeros(1, 1)).unwrap();
        assert_eq!(probabilities.row(0), &[0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_target_means() {
        let features = Matrix::zeros(2, 3);
        let targets =
            Targets::Values(Matrix::from_rows(&[vec![1.0, 10.0], vec![2.0, 30.0]]).unwrap());
        let mut dummy = DummyEstimator::new();
        dummy.fit(&features, &targets).unwrap();

        match dummy.predict(&Matrix::zeros(1, 3)).unwrap() {
            PredictionOutput::Values(values) => {
                assert_relative_eq!(values.get(0, 0), 1.5);
                assert_relative_eq!(values.get(0, 1), 20.0);
            }
            other => panic!("unexpected output {other:?}"),
        }
        assert!(matches!(
            dummy.predict_probabilities(&Matrix::zeros(1, 3)),
            Err(RunnerError::CapabilityUnsupported { .. })
        ));
    }

    #[test]
    fn test_width_is_checked() {
        let mut dummy = DummyEstimator::new();
        assert!(matches!(
            dummy.predict(&Matrix::zeros(1, 1)),
            Err(RunnerError::ModelNotTrained)
        ));
        dummy
            .fit(&Matrix::zeros(1, 2), &Targets::Values(Matrix::column_vector(vec![1.0])))
            .unwrap();
        assert!(dummy.predict(&Matrix::zeros(1, 5)).is_err());
    }
}
