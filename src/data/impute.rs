//! Missing-value imputation
//!
//! Column sums are accumulated while the feature matrix is being extracted, so
//! the mean is available without a second scan. The mean divides the sum of the
//! present values by the full row count of the table.

use crate::core::Matrix;
use serde::{Deserialize, Serialize};

/// Position of a feature cell that held the missing marker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissingEntry {
    pub row: usize,
    pub column: usize,
}

/// Replacement value for missing numeric cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// sum(present values) / row count
    #[default]
    Mean,
    /// Constant zero
    Zero,
}

/// Single-pass accumulator of column sums and missing positions
#[derive(Debug, Clone)]
pub struct ColumnAccumulator {
    sums: Vec<f64>,
    missing: Vec<MissingEntry>,
}

/// What an imputation pass did
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationSummary {
    /// Number of cells that were filled
    pub filled: usize,
    /// Fill value used per output column, only for columns that had gaps
    pub fill_values: Vec<(usize, f64)>,
}

impl ColumnAccumulator {
    pub fn new(width: usize) -> Self {
        Self {
            sums: vec![0.0; width],
            missing: Vec::new(),
        }
    }

    /// Record a value for `(row, column)`; returns what to store in the matrix
    ///
    /// Missing values are recorded and stored as NaN until [`finish`](Self::finish).
    pub fn observe(&mut self, row: usize, column: usize, value: Option<f64>) -> f64 {
        match value {
            Some(v) => {
                self.sums[column] += v;
                v
            }
            None => {
                self.missing.push(MissingEntry { row, column });
                f64::NAN
            }
        }
    }

    /// Sum of present values seen so far in a column
    pub fn column_sum(&self, column: usize) -> f64 {
        self.sums[column]
    }

    /// Recorded missing positions
    pub fn missing(&self) -> &[MissingEntry] {
        &self.missing
    }

    /// Fill every recorded missing cell of `matrix`
    ///
    /// Only previously missing cells are written.
    pub fn finish(self, matrix: &mut Matrix, strategy: ImputeStrategy) -> ImputationSummary {
        let row_count = matrix.rows();
        let mut fill_values: Vec<(usize, f64)> = Vec::new();

        for entry in &self.missing {
            let fill = match strategy {
                ImputeStrategy::Mean => self.sums[entry.column] / row_count as f64,
                ImputeStrategy::Zero => 0.0,
            };
            matrix.set(entry.row, entry.column, fill);
            if !fill_values.iter().any(|&(c, _)| c == entry.column) {
                fill_values.push((entry.column, fill));
            }
        }

        fill_values.sort_by_key(|&(c, _)| c);
        ImputationSummary {
            filled: self.missing.len(),
            fill_values,
        }
    }
}
