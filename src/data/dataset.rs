//! Turning parsed tables into numeric feature/target matrices
//!
//! A [`Preprocessor`] is fitted on the training table and then applied
//! unchanged to test tables, so both sides share the same column split,
//! indicator layout and class order.

use crate::core::{AttributeDescriptor, Matrix, ProblemType, Result, RunnerError, Targets};
use crate::data::arff::RawTable;
use crate::data::encode::{ClassEncoder, FeatureEncoder};
use crate::data::impute::ImputeStrategy;
use crate::data::split::{ColumnSplit, TargetSelection};
use log::info;
use serde::{Deserialize, Serialize};

/// Numeric view of a training table
#[derive(Debug, Clone)]
pub struct ParsedDataset {
    /// entry_count x encoded feature width
    pub features: Matrix,
    /// entry_count x target width (one-hot for classification)
    pub targets: Matrix,
    /// Descriptors of the source feature columns
    pub feature_attributes: Vec<AttributeDescriptor>,
    /// Descriptors of the target columns
    pub target_attributes: Vec<AttributeDescriptor>,
    /// Class index per row, classification only
    pub class_indices: Option<Vec<usize>>,
    /// Number of feature cells filled by imputation
    pub imputed_cells: usize,
}

impl ParsedDataset {
    pub fn len(&self) -> usize {
        self.features.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Targets in the form estimators are fitted on
    pub fn estimator_targets(&self) -> Targets {
        match &self.class_indices {
            Some(indices) => Targets::Classes {
                indices: indices.clone(),
                n_classes: self.targets.cols(),
            },
            None => Targets::Values(self.targets.clone()),
        }
    }
}

/// Fitted column split, feature encoding and class mapping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    problem: ProblemType,
    split: ColumnSplit,
    features: FeatureEncoder,
    classes: Option<ClassEncoder>,
    target_attributes: Vec<AttributeDescriptor>,
    impute: ImputeStrategy,
}

impl Preprocessor {
    /// Fit on a training table and return the encoded training data
    pub fn fit(
        table: &RawTable,
        problem: ProblemType,
        selection: &TargetSelection,
        impute: ImputeStrategy,
    ) -> Result<(Self, ParsedDataset)> {
        let split = ColumnSplit::resolve(table, selection)?;
        if problem == ProblemType::Classification && split.target_columns().len() != 1 {
            return Err(RunnerError::Argument(
                "Multiple targets are not supported for classification".to_string(),
            ));
        }

        let features = if table.is_numeric_except(split.target_columns()) {
            FeatureEncoder::numeric(table, split.feature_columns())
        } else {
            FeatureEncoder::fit(table, split.feature_columns())
        };
        let encoded = features.transform(table, impute)?;

        let (targets, classes, class_indices) = match problem {
            ProblemType::Classification => {
                let col = split.target_columns()[0];
                let classes = ClassEncoder::fit(table, col)?;
                let indices = classes.encode(table, col)?;
                (classes.one_hot(&indices), Some(classes), Some(indices))
            }
            ProblemType::Regression => (split.regression_targets(table)?, None, None),
        };

        let target_attributes: Vec<AttributeDescriptor> = split
            .target_columns()
            .iter()
            .map(|&c| table.attribute(c).clone())
            .collect();

        info!(
            "Prepared {} rows: {} feature columns encoded to width {}, target width {}",
            table.len(),
            split.feature_columns().len(),
            features.width(),
            targets.cols()
        );

        let dataset = ParsedDataset {
            features: encoded.matrix,
            targets,
            feature_attributes: features.attributes().to_vec(),
            target_attributes: target_attributes.clone(),
            class_indices,
            imputed_cells: encoded.imputation.filled,
        };

        let preprocessor = Self {
            problem,
            split,
            features,
            classes,
            target_attributes,
            impute,
        };

        Ok((preprocessor, dataset))
    }

    /// Encode the feature columns of a table; target columns are not read
    pub fn transform(&self, table: &RawTable) -> Result<Matrix> {
        self.split.check_table(table)?;
        let encoded = self.features.transform(table, self.impute)?;
        Ok(encoded.matrix)
    }

    pub fn problem(&self) -> ProblemType {
        self.problem
    }

    /// Width of the encoded feature matrix
    pub fn feature_width(&self) -> usize {
        self.features.width()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.feature_names()
    }

    /// Class labels in index order, classification only
    pub fn class_labels(&self) -> Option<&[String]> {
        self.classes.as_ref().map(|c| c.labels())
    }

    pub fn target_attributes(&self) -> &[AttributeDescriptor] {
        &self.target_attributes
    }
}
