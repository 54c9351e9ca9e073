//! Data loading and normalization
//!
//! This module turns ARFF files into the numeric matrices estimators consume:
//! parsing, feature/target splitting, missing-value imputation and
//! categorical encoding.

pub mod arff;
pub mod dataset;
pub mod encode;
pub mod impute;
pub mod split;

pub use self::arff::{DataFormat, RawRow, RawTable};
pub use self::dataset::{ParsedDataset, Preprocessor};
pub use self::encode::{ClassEncoder, ColumnEncoding, FeatureEncoder};
pub use self::impute::{ColumnAccumulator, ImputeStrategy, MissingEntry};
pub use self::split::{ColumnSplit, TargetSelection};
