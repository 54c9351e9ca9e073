//! Ridge regression with an intercept
//!
//! Features and targets are centred, the regularized normal equations
//! `(XᵀX + αI) W = XᵀY` are solved once for all target columns, and the
//! intercept is recovered from the column means. Classification fits one-hot
//! targets and predicts the arg-max column.

use crate::core::{Estimator, Matrix, PredictionOutput, Result, RunnerError, Targets};
use crate::estimator::knn::argmax;
use crate::estimator::{check_fit_input, check_width};
use serde::{Deserialize, Serialize};

const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    alpha: f64,
    state: Option<LinearState>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct LinearState {
    /// n_features x n_outputs
    weights: Matrix,
    intercept: Vec<f64>,
    classification: bool,
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, state: None }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fitted weights, one column per output
    pub fn weights(&self) -> Option<&Matrix> {
        self.state.as_ref().map(|s| &s.weights)
    }

    pub fn intercept(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.intercept.as_slice())
    }

    fn decision_values(&self, state: &LinearState, features: &Matrix) -> Matrix {
        let outputs = state.intercept.len();
        let mut out = Matrix::zeros(features.rows(), outputs);
        for row in 0..features.rows() {
            let x = features.row(row);
            for o in 0..outputs {
                let dot: f64 = x
                    .iter()
                    .enumerate()
                    .map(|(j, v)| v * state.weights.get(j, o))
                    .sum();
                out.set(row, o, dot + state.intercept[o]);
            }
        }
        out
    }
}

impl Estimator for RidgeRegression {
    fn name(&self) -> &str {
        "ridge"
    }

    fn fit(&mut self, features: &Matrix, targets: &Targets) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(RunnerError::Argument(format!(
                "Regularization strength must be a non-negative number, got {}",
                self.alpha
            )));
        }
        check_fit_input(features, targets)?;

        let y = targets.to_matrix();
        let n = features.rows();
        let d = features.cols();
        let m = y.cols();

        let x_mean = column_means(features);
        let y_mean = column_means(&y);

        // Gram matrix and right-hand side on centred data
        let mut gram = vec![0.0; d * d];
        let mut rhs = vec![0.0; d * m];
        for i in 0..n {
            let xi = features.row(i);
            for a in 0..d {
                let xa = xi[a] - x_mean[a];
                for b in a..d {
                    gram[a * d + b] += xa * (xi[b] - x_mean[b]);
                }
                for o in 0..m {
                    rhs[a * m + o] += xa * (y.get(i, o) - y_mean[o]);
                }
            }
        }
        for a in 0..d {
            for b in 0..a {
                gram[a * d + b] = gram[b * d + a];
            }
            gram[a * d + a] += self.alpha;
        }

        let solution = solve_linear_system(gram, rhs, d, m)?;
        let weights = Matrix::from_vec(d, m, solution)?;

        let intercept: Vec<f64> = (0..m)
            .map(|o| {
                let shift: f64 = (0..d).map(|j| x_mean[j] * weights.get(j, o)).sum();
                y_mean[o] - shift
            })
            .collect();

        self.state = Some(LinearState {
            weights,
            intercept,
            classification: matches!(targets, Targets::Classes { .. }),
        });
        Ok(())
    }

    fn predict(&self, features: &Matrix) -> Result<PredictionOutput> {
        let state = self.state.as_ref().ok_or(RunnerError::ModelNotTrained)?;
        check_width(features, state.weights.rows())?;

        let values = self.decision_values(state, features);
        if state.classification {
            Ok(PredictionOutput::Labels(
                (0..values.rows()).map(|r| argmax(values.row(r))).collect(),
            ))
        } else {
            Ok(PredictionOutput::Values(values))
        }
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

fn column_means(matrix: &Matrix) -> Vec<f64> {
    let n = matrix.rows().max(1) as f64;
    (0..matrix.cols())
        .map(|c| matrix.column(c).iter().sum::<f64>() / n)
        .collect()
}

/// Solve `A X = B` for an `n x n` system with `m` right-hand sides
///
/// Gaussian elimination with partial pivoting, both buffers row-major.
fn solve_linear_system(mut a: Vec<f64>, mut b: Vec<f64>, n: usize, m: usize) -> Result<Vec<f64>> {
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))
            .unwrap_or(col);
        if a[pivot * n + col].abs() < PIVOT_EPSILON {
            return Err(RunnerError::Numerical(
                "singular system, increase the regularization strength".to_string(),
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap(col * n + k, pivot * n + k);
            }
            for k in 0..m {
                b.swap(col * m + k, pivot * m + k);
            }
        }

        for row in (col + 1)..n {
            let factor = a[row * n + col] / a[col * n + col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            for k in 0..m {
                b[row * m + k] -= factor * b[col * m + k];
            }
        }
    }

    let mut x = vec![0.0; n * m];
    for row in (0..n).rev() {
        for k in 0..m {
            let mut acc = b[row * m + k];
            for j in (row + 1)..n {
                acc -= a[row * n + j] * x[j * m + k];
            }
            x[row * m + k] = acc / a[row * n + row];
        }
    }
    Ok(x)
}
