//! k-nearest-neighbour estimator

use crate::core::{Estimator, Matrix, PredictionOutput, Result, RunnerError, Targets};
use crate::estimator::{check_fit_input, check_width};
use serde::{Deserialize, Serialize};

/// Euclidean k-nearest-neighbour classifier/regressor
///
/// Neighbours are ordered by distance, then by training row. Classification
/// predicts the majority class (lowest class index on ties) and reports vote
/// fractions as probabilities; regression averages the neighbours' targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    k: usize,
    training: Option<NeighborIndex>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct NeighborIndex {
    features: Matrix,
    targets: Targets,
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self { k, training: None }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn index(&self) -> Result<&NeighborIndex> {
        self.training.as_ref().ok_or(RunnerError::ModelNotTrained)
    }

    /// Training rows closest to `query`, nearest first
    fn neighbors(&self, index: &NeighborIndex, query: &[f64]) -> Vec<usize> {
        let train = &index.features;
        let mut distances: Vec<(f64, usize)> = (0..train.rows())
            .map(|i| (squared_distance(train.row(i), query), i))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        distances.truncate(self.k.min(train.rows()));
        distances.into_iter().map(|(_, i)| i).collect()
    }

    fn class_votes(&self, index: &NeighborIndex, features: &Matrix) -> Result<Matrix> {
        let (classes, n_classes) = match &index.targets {
            Targets::Classes { indices, n_classes } => (indices, *n_classes),
            Targets::Values(_) => {
                return Err(RunnerError::CapabilityUnsupported {
                    estimator: self.name().to_string(),
                    capability: "probability prediction for regression targets",
                })
            }
        };

        let mut votes = Matrix::zeros(features.rows(), n_classes);
        for row in 0..features.rows() {
            let neighbors = self.neighbors(index, features.row(row));
            let share = 1.0 / neighbors.len() as f64;
            for n in neighbors {
                let class = classes[n];
                votes.set(row, class, votes.get(row, class) + share);
            }
        }
        Ok(votes)
    }
}

impl Estimator for KNearestNeighbors {
    fn name(&self) -> &str {
        "knn"
    }

    fn fit(&mut self, features: &Matrix, targets: &Targets) -> Result<()> {
        if self.k == 0 {
            return Err(RunnerError::Argument(
                "Number of neighbours must be positive".to_string(),
            ));
        }
        check_fit_input(features, targets)?;
        self.training = Some(NeighborIndex {
            features: features.clone(),
            targets: targets.clone(),
        });
        Ok(())
    }

    fn predict(&self, features: &Matrix) -> Result<PredictionOutput> {
        let index = self.index()?;
        check_width(features, index.features.cols())?;

        match &index.targets {
            Targets::Classes { .. } => {
                let votes = self.class_votes(index, features)?;
                Ok(PredictionOutput::Labels(
                    (0..votes.rows()).map(|r| argmax(votes.row(r))).collect(),
                ))
            }
            Targets::Values(values) => {
                let mut out = Matrix::zeros(features.rows(), values.cols());
                for row in 0..features.rows() {
                    let neighbors = self.neighbors(index, features.row(row));
                    for col in 0..values.cols() {
                        let sum: f64 = neighbors.iter().map(|&n| values.get(n, col)).sum();
                        out.set(row, col, sum / neighbors.len() as f64);
                    }
                }
                Ok(PredictionOutput::Values(out))
            }
        }
    }

    fn predict_probabilities(&self, features: &Matrix) -> Result<Matrix> {
        let index = self.index()?;
        check_width(features, index.features.cols())?;
        self.class_votes(index, features)
    }

    fn is_fitted(&self) -> bool {
        self.training.is_some()
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the largest value, first one on ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
