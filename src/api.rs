//! High-level API for fitting and applying ARFF pipelines
//!
//! A [`Learner`] collects the problem type, target selection and estimator
//! choice; fitting it on a training table yields a [`TrainedPipeline`] that
//! owns the fitted preprocessing together with the fitted estimator.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use arffml::api::Learner;
//! use arffml::estimator::{EstimatorKind, EstimatorSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Learner::classification()
//!     .with_estimator(EstimatorSpec::new(EstimatorKind::Knn).with_neighbors(3))
//!     .fit_from_file("train.arff")?;
//!
//! let predictions = pipeline.predict_from_file("test.arff", true)?;
//! println!("{} predictions", predictions.len());
//! # Ok(())
//! # }
//! ```

use crate::core::{Estimator, PredictionOutput, ProblemType, Result, RunnerError};
use crate::data::{ImputeStrategy, Preprocessor, RawTable, TargetSelection};
use crate::estimator::{EstimatorAdapter, EstimatorModel, EstimatorSpec};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline builder
#[derive(Clone, Debug)]
pub struct Learner {
    problem: ProblemType,
    targets: TargetSelection,
    impute: ImputeStrategy,
    estimator: EstimatorSpec,
    seed: i64,
}

impl Learner {
    pub fn new(problem: ProblemType) -> Self {
        Self {
            problem,
            targets: TargetSelection::Default,
            impute: ImputeStrategy::default(),
            estimator: EstimatorSpec::default(),
            seed: 0,
        }
    }

    pub fn classification() -> Self {
        Self::new(ProblemType::Classification)
    }

    pub fn regression() -> Self {
        Self::new(ProblemType::Regression)
    }

    /// Use explicit target column indices instead of the class column
    pub fn with_targets(mut self, targets: TargetSelection) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_impute(mut self, impute: ImputeStrategy) -> Self {
        self.impute = impute;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorSpec) -> Self {
        self.estimator = estimator;
        self
    }

    /// Seed recorded with the fitted pipeline
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit on a parsed training table
    pub fn fit(self, table: &RawTable) -> Result<TrainedPipeline> {
        let (preprocessor, dataset) =
            Preprocessor::fit(table, self.problem, &self.targets, self.impute)?;

        if self.problem == ProblemType::Regression && dataset.len() < 2 {
            return Err(RunnerError::insufficient_data(
                "regression needs at least two training rows",
            ));
        }
        if dataset.imputed_cells > 0 {
            info!("Imputed {} missing feature cells", dataset.imputed_cells);
        }

        let mut adapter = EstimatorAdapter::new(self.estimator.build());
        adapter.fit(&dataset)?;

        Ok(TrainedPipeline {
            preprocessor,
            adapter,
            seed: self.seed,
            n_training_rows: dataset.len(),
        })
    }

    /// Fit on an ARFF file
    pub fn fit_from_file<P: AsRef<Path>>(self, path: P) -> Result<TrainedPipeline> {
        let table = RawTable::from_file(path)?;
        self.fit(&table)
    }
}

/// Fitted preprocessing plus fitted estimator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    preprocessor: Preprocessor,
    adapter: EstimatorAdapter<EstimatorModel>,
    seed: i64,
    n_training_rows: usize,
}

impl TrainedPipeline {
    /// Predict for every row of a table
    ///
    /// With `probabilities` set, class probabilities are returned when the
    /// estimator supports them and hard predictions otherwise.
    pub fn predict(&self, table: &RawTable, probabilities: bool) -> Result<PredictionOutput> {
        let features = self.preprocessor.transform(table)?;
        let wants_probabilities =
            probabilities && self.preprocessor.problem() == ProblemType::Classification;
        self.adapter.predict(&features, wants_probabilities)
    }

    /// Predict for every row of an ARFF file
    pub fn predict_from_file<P: AsRef<Path>>(
        &self,
        path: P,
        probabilities: bool,
    ) -> Result<PredictionOutput> {
        let table = RawTable::from_file(path)?;
        self.predict(&table, probabilities)
    }

    /// Summary of the fitted pipeline
    pub fn info(&self) -> PipelineInfo {
        PipelineInfo {
            estimator: self.adapter.estimator().name().to_string(),
            problem: self.preprocessor.problem(),
            seed: self.seed,
            n_features: self.preprocessor.feature_width(),
            n_training_rows: self.n_training_rows,
            class_labels: self
                .preprocessor
                .class_labels()
                .map(|labels| labels.to_vec()),
        }
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }
}

/// Pipeline summary used for logging and model metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInfo {
    pub estimator: String,
    pub problem: ProblemType,
    pub seed: i64,
    /// Encoded feature width
    pub n_features: usize,
    pub n_training_rows: usize,
    pub class_labels: Option<Vec<String>>,
}
