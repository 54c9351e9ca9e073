//! Categorical feature and class label encoding

use crate::core::{AttributeDescriptor, AttributeKind, Cell, Matrix, Result, RunnerError};
use crate::data::arff::RawTable;
use crate::data::impute::{ColumnAccumulator, ImputationSummary, ImputeStrategy};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How one feature column is turned into matrix columns
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnEncoding {
    /// Passed through as one numeric column
    Numeric,
    /// One indicator column per category, categories in lexical order
    Indicator { categories: Vec<String> },
}

impl ColumnEncoding {
    /// Number of matrix columns produced
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoding::Numeric => 1,
            ColumnEncoding::Indicator { categories } => categories.len(),
        }
    }
}

/// Fitted encoder for the feature columns of a table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<usize>,
    attributes: Vec<AttributeDescriptor>,
    encodings: Vec<ColumnEncoding>,
}

/// Encoded feature matrix plus what imputation did to it
#[derive(Debug, Clone)]
pub struct EncodedFeatures {
    pub matrix: Matrix,
    pub imputation: ImputationSummary,
}

impl FeatureEncoder {
    /// Learn the encoding of `columns` from a training table
    pub fn fit(table: &RawTable, columns: &[usize]) -> Self {
        let mut attributes = Vec::with_capacity(columns.len());
        let mut encodings = Vec::with_capacity(columns.len());

        for &col in columns {
            let attribute = table.attribute(col);
            let encoding = if attribute.kind.is_numeric() {
                ColumnEncoding::Numeric
            } else {
                let categories: BTreeSet<String> = (0..table.len())
                    .filter_map(|row| table.cell(row, col).category_key())
                    .collect();
                ColumnEncoding::Indicator {
                    categories: categories.into_iter().collect(),
                }
            };
            attributes.push(attribute.clone());
            encodings.push(encoding);
        }

        let encoder = Self {
            columns: columns.to_vec(),
            attributes,
            encodings,
        };
        debug!(
            "Indicator encoding expands {} feature columns to {}",
            encoder.columns.len(),
            encoder.width()
        );
        encoder
    }

    /// Pass-through encoding for tables whose feature columns are all numeric
    pub fn numeric(table: &RawTable, columns: &[usize]) -> Self {
        debug!("All feature columns are numeric, no indicator encoding required");
        Self {
            columns: columns.to_vec(),
            attributes: columns.iter().map(|&c| table.attribute(c).clone()).collect(),
            encodings: vec![ColumnEncoding::Numeric; columns.len()],
        }
    }

    /// Width of the encoded feature matrix
    pub fn width(&self) -> usize {
        self.encodings.iter().map(ColumnEncoding::width).sum()
    }

    /// Descriptors of the source feature columns
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn encodings(&self) -> &[ColumnEncoding] {
        &self.encodings
    }

    /// Names of the encoded columns (`name` or `name=category`)
    pub fn feature_names(&self) -> Vec<String> {
        self.attributes
            .iter()
            .zip(&self.encodings)
            .flat_map(|(attribute, encoding)| match encoding {
                ColumnEncoding::Numeric => vec![attribute.name.clone()],
                ColumnEncoding::Indicator { categories } => categories
                    .iter()
                    .map(|c| format!("{}={}", attribute.name, c))
                    .collect(),
            })
            .collect()
    }

    /// Encode a table's feature columns and impute missing numeric cells
    ///
    /// Categories not seen during fitting and missing categorical cells both
    /// produce an all-zero indicator block.
    pub fn transform(&self, table: &RawTable, strategy: ImputeStrategy) -> Result<EncodedFeatures> {
        self.check_compatible(table)?;

        let width = self.width();
        let mut matrix = Matrix::zeros(table.len(), width);
        let mut accumulator = ColumnAccumulator::new(width);

        for row in 0..table.len() {
            let mut offset = 0;
            for (&col, encoding) in self.columns.iter().zip(&self.encodings) {
                let cell = table.cell(row, col);
                match encoding {
                    ColumnEncoding::Numeric => {
                        let value = match cell {
                            Cell::Number(v) => Some(*v),
                            Cell::Missing => None,
                            other => {
                                return Err(RunnerError::Parse(format!(
                                    "Non-numeric value {:?} in numeric column '{}'",
                                    other,
                                    table.attribute(col).name
                                )))
                            }
                        };
                        let stored = accumulator.observe(row, offset, value);
                        matrix.set(row, offset, stored);
                    }
                    ColumnEncoding::Indicator { categories } => {
                        if let Some(key) = cell.category_key() {
                            if let Ok(pos) = categories.binary_search(&key) {
                                matrix.set(row, offset + pos, 1.0);
                            }
                        }
                    }
                }
                offset += encoding.width();
            }
        }

        let imputation = accumulator.finish(&mut matrix, strategy);
        if imputation.filled > 0 {
            debug!(
                "Imputed {} missing feature cells ({:?})",
                imputation.filled, strategy
            );
        }

        Ok(EncodedFeatures { matrix, imputation })
    }

    fn check_compatible(&self, table: &RawTable) -> Result<()> {
        for (&col, attribute) in self.columns.iter().zip(&self.attributes) {
            if col >= table.n_columns() {
                return Err(RunnerError::DimensionMismatch {
                    expected: col + 1,
                    actual: table.n_columns(),
                });
            }
            let actual = table.attribute(col);
            if actual.kind.is_numeric() != attribute.kind.is_numeric() {
                return Err(RunnerError::Parse(format!(
                    "Attribute '{}' changed between numeric and categorical",
                    actual.name
                )));
            }
        }
        Ok(())
    }
}

/// Mapping between class labels and class indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassEncoder {
    attribute: String,
    labels: Vec<String>,
}

impl ClassEncoder {
    /// Learn the classes of column `col`: declared domain order for nominal
    /// attributes, encountered order otherwise
    pub fn fit(table: &RawTable, col: usize) -> Result<Self> {
        let attribute = table.attribute(col);
        let labels = match &attribute.kind {
            AttributeKind::Nominal(domain) => domain.clone(),
            AttributeKind::Numeric | AttributeKind::Text => {
                let mut labels: Vec<String> = Vec::new();
                for row in 0..table.len() {
                    if let Some(key) = table.cell(row, col).category_key() {
                        if !labels.contains(&key) {
                            labels.push(key);
                        }
                    }
                }
                labels
            }
        };

        if labels.is_empty() {
            return Err(RunnerError::InvalidDataset(format!(
                "Class attribute '{}' has no classes",
                attribute.name
            )));
        }

        Ok(Self {
            attribute: attribute.name.clone(),
            labels,
        })
    }

    /// Class index of every row in column `col`
    pub fn encode(&self, table: &RawTable, col: usize) -> Result<Vec<usize>> {
        (0..table.len())
            .map(|row| {
                let key = table.cell(row, col).category_key().ok_or_else(|| {
                    RunnerError::Parse(format!(
                        "Missing class value in row {} of attribute '{}'",
                        row + 1,
                        self.attribute
                    ))
                })?;
                self.index_of(&key).ok_or_else(|| {
                    RunnerError::Parse(format!(
                        "Unknown class '{}' for attribute '{}'",
                        key, self.attribute
                    ))
                })
            })
            .collect()
    }

    /// One-hot matrix: cell (i, k) is 1 iff row i has class k
    pub fn one_hot(&self, indices: &[usize]) -> Matrix {
        let mut matrix = Matrix::zeros(indices.len(), self.labels.len());
        for (row, &class) in indices.iter().enumerate() {
            matrix.set(row, class, 1.0);
        }
        matrix
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
