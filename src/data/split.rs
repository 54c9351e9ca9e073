//! Feature/target column splitting

use crate::core::{Cell, Matrix, Result, RunnerError};
use crate::data::arff::RawTable;
use serde::{Deserialize, Serialize};

/// How the target columns of a table are chosen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetSelection {
    /// The attribute named `class`, or the last attribute
    #[default]
    Default,
    /// Explicit column indices, in the given order
    Explicit(Vec<usize>),
}

/// Partition of a table's columns into features and targets
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSplit {
    n_columns: usize,
    feature_columns: Vec<usize>,
    target_columns: Vec<usize>,
}

impl ColumnSplit {
    /// Resolve the split for a parsed table
    pub fn resolve(table: &RawTable, selection: &TargetSelection) -> Result<Self> {
        Self::for_columns(table.n_columns(), table.class_index(), selection)
    }

    /// Resolve the split for `n_columns` columns whose default target is `default_target`
    pub fn for_columns(
        n_columns: usize,
        default_target: usize,
        selection: &TargetSelection,
    ) -> Result<Self> {
        let target_columns = match selection {
            TargetSelection::Default => vec![default_target],
            TargetSelection::Explicit(indices) => {
                if indices.is_empty() {
                    return Err(RunnerError::Argument(
                        "Empty target index list".to_string(),
                    ));
                }
                for (pos, &index) in indices.iter().enumerate() {
                    if index >= n_columns {
                        return Err(RunnerError::Argument(format!(
                            "Target index {index} out of range for {n_columns} columns"
                        )));
                    }
                    if indices[..pos].contains(&index) {
                        return Err(RunnerError::Argument(format!(
                            "Target index {index} given more than once"
                        )));
                    }
                }
                indices.clone()
            }
        };

        let feature_columns = (0..n_columns)
            .filter(|c| !target_columns.contains(c))
            .collect();

        Ok(Self {
            n_columns,
            feature_columns,
            target_columns,
        })
    }

    /// Total number of columns the split was resolved for
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Feature columns in original order
    pub fn feature_columns(&self) -> &[usize] {
        &self.feature_columns
    }

    /// Target columns in selection order
    pub fn target_columns(&self) -> &[usize] {
        &self.target_columns
    }

    /// Check that a table has the column count this split was resolved for
    pub fn check_table(&self, table: &RawTable) -> Result<()> {
        if table.n_columns() != self.n_columns {
            return Err(RunnerError::Parse(format!(
                "Expected {} attributes, table declares {}",
                self.n_columns,
                table.n_columns()
            )));
        }
        Ok(())
    }

    /// Numeric regression target matrix, one column per target column
    pub fn regression_targets(&self, table: &RawTable) -> Result<Matrix> {
        let width = self.target_columns.len();
        let mut targets = Matrix::zeros(table.len(), width);

        for row in 0..table.len() {
            for (out, &col) in self.target_columns.iter().enumerate() {
                let value = match table.cell(row, col) {
                    Cell::Number(v) => *v,
                    Cell::Missing => {
                        return Err(RunnerError::Parse(format!(
                            "Missing target value in row {} of attribute '{}'",
                            row + 1,
                            table.attribute(col).name
                        )))
                    }
                    _ => {
                        return Err(RunnerError::Parse(format!(
                            "Target attribute '{}' is not numeric",
                            table.attribute(col).name
                        )))
                    }
                };
                targets.set(row, out, value);
            }
        }

        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_columns() -> RawTable {
        "@relation r\n\
         @attribute c0 numeric\n\
         @attribute c1 numeric\n\
         @attribute c2 numeric\n\
         @attribute c3 numeric\n\
         @attribute c4 numeric\n\
         @data\n\
         0, 1, 2, 3, 4\n\
         10, 11, 12, 13, 14\n"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_default_split_uses_last_column() {
        let table = five_columns();
        let split = ColumnSplit::resolve(&table, &TargetSelection::Default).unwrap();
        assert_eq!(split.target_columns(), &[4]);
        assert_eq!(split.feature_columns(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_default_split_prefers_class() {
        let table: RawTable = "@relation r\n@attribute CLASS {a}\n@attribute x numeric\n@data\na, 1\n"
            .parse()
            .unwrap();
        let split = ColumnSplit::resolve(&table, &TargetSelection::Default).unwrap();
        assert_eq!(split.target_columns(), &[0]);
        assert_eq!(split.feature_columns(), &[1]);
    }

    #[test]
    fn test_explicit_targets_keep_order() {
        let table = five_columns();
        let split = ColumnSplit::resolve(&table, &TargetSelection::Explicit(vec![4, 2])).unwrap();
        assert_eq!(split.target_columns(), &[4, 2]);
        assert_eq!(split.feature_columns(), &[0, 1, 3]);

        let targets = split.regression_targets(&table).unwrap();
        assert_eq!(targets.to_rows(), vec![vec![4.0, 2.0], vec![14.0, 12.0]]);
    }

    #[test]
    fn test_invalid_explicit_targets() {
        let out_of_range = ColumnSplit::for_columns(5, 4, &TargetSelection::Explicit(vec![5]));
        assert!(matches!(out_of_range, Err(RunnerError::Argument(_))));

        let duplicate = ColumnSplit::for_columns(5, 4, &TargetSelection::Explicit(vec![1, 1]));
        assert!(matches!(duplicate, Err(RunnerError::Argument(_))));

        let empty = ColumnSplit::for_columns(5, 4, &TargetSelection::Explicit(vec![]));
        assert!(matches!(empty, Err(RunnerError::Argument(_))));
    }

    #[test]
    fn test_regression_target_errors() {
        let missing: RawTable = "@relation r\n@attribute x numeric\n@attribute y numeric\n@data\n1, ?\n"
            .parse()
            .unwrap();
        let split = ColumnSplit::resolve(&missing, &TargetSelection::Default).unwrap();
        assert!(matches!(
            split.regression_targets(&missing),
            Err(RunnerError::Parse(_))
        ));

        let nominal: RawTable = "@relation r\n@attribute x numeric\n@attribute y {a}\n@data\n1, a\n"
            .parse()
            .unwrap();
        let split = ColumnSplit::resolve(&nominal, &TargetSelection::Default).unwrap();
        let err = split.regression_targets(&nominal).unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }

    #[test]
    fn test_check_table() {
        let table = five_columns();
        let split = ColumnSplit::for_columns(4, 3, &TargetSelection::Default).unwrap();
        assert!(split.check_table(&table).is_err());
    }
}
