//! Core type definitions shared by the data layer and the estimators

use crate::core::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense row-major matrix of `f64` values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create a matrix from a flat row-major buffer
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(RunnerError::DimensionMismatch {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from nested rows; every row must have the same length
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(RunnerError::DimensionMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Single-column matrix from a vector
    pub fn column_vector(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Get a value
    ///
    /// # Panics
    /// Panics if the position is out of bounds
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "Matrix index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Set a value
    ///
    /// # Panics
    /// Panics if the position is out of bounds
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "Matrix index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics; a zero-width matrix has an empty buffer
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Copy the matrix into nested rows
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.iter_rows().map(|r| r.to_vec()).collect()
    }

    /// Copy one column
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Raw row-major buffer
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// A single parsed ARFF value
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// Numeric value
    Number(f64),
    /// Value of a nominal attribute
    Label(String),
    /// Value of a string or date attribute
    Text(String),
    /// The `?` marker
    Missing,
}

impl Cell {
    /// Categorical key for labels, text and numbers; `None` when missing
    pub fn category_key(&self) -> Option<String> {
        match self {
            Cell::Number(v) => Some(format_number(*v)),
            Cell::Label(s) | Cell::Text(s) => Some(s.clone()),
            Cell::Missing => None,
        }
    }
}

/// Format a number the way it is used as a class or category name
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Kind of an ARFF attribute
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// numeric, real or integer
    Numeric,
    /// Finite set of labels in declaration order
    Nominal(Vec<String>),
    /// string-valued (string-encoded time series, dates)
    Text,
}

impl AttributeKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeKind::Numeric)
    }
}

/// Name and kind of one column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Declared labels of a nominal attribute
    pub fn domain(&self) -> Option<&[String]> {
        match &self.kind {
            AttributeKind::Nominal(labels) => Some(labels),
            _ => None,
        }
    }

    /// Value an omitted column takes in a sparse row
    pub fn sparse_default(&self) -> Cell {
        match &self.kind {
            AttributeKind::Numeric => Cell::Number(0.0),
            AttributeKind::Nominal(labels) => labels
                .first()
                .map(|l| Cell::Label(l.clone()))
                .unwrap_or(Cell::Missing),
            AttributeKind::Text => Cell::Text(String::new()),
        }
    }
}

/// Learning problem type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemType {
    Classification,
    Regression,
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemType::Classification => write!(f, "classification"),
            ProblemType::Regression => write!(f, "regression"),
        }
    }
}

/// Training targets handed to an estimator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Targets {
    /// Class-index vector
    Classes { indices: Vec<usize>, n_classes: usize },
    /// One column per regression target
    Values(Matrix),
}

impl Targets {
    pub fn len(&self) -> usize {
        match self {
            Targets::Classes { indices, .. } => indices.len(),
            Targets::Values(m) => m.rows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One-hot expansion of class targets, or the value matrix for regression
    pub fn to_matrix(&self) -> Matrix {
        match self {
            Targets::Classes { indices, n_classes } => {
                let mut m = Matrix::zeros(indices.len(), *n_classes);
                for (row, &class) in indices.iter().enumerate() {
                    m.set(row, class, 1.0);
                }
                m
            }
            Targets::Values(m) => m.clone(),
        }
    }
}

/// Output of a predict call
#[derive(Clone, Debug, PartialEq)]
pub enum PredictionOutput {
    /// Hard class indices, one per instance
    Labels(Vec<usize>),
    /// Regression values, one row per instance
    Values(Matrix),
    /// Class probability vectors, one row per instance
    Probabilities(Matrix),
}

impl PredictionOutput {
    pub fn len(&self) -> usize {
        match self {
            PredictionOutput::Labels(l) => l.len(),
            PredictionOutput::Values(m) | PredictionOutput::Probabilities(m) => m.rows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
