//! Run sequencing for one train/test/predict invocation
//!
//! The driver walks `Idle -> ArgsValidated -> DataLoaded -> Fitting|Loading ->
//! Trained|Predicting -> Done|Failed`. Output files are only written through
//! atomic renames, so a failed run leaves no partial model or prediction file.

use crate::api::{Learner, TrainedPipeline};
use crate::config::{RunConfig, RunMode};
use crate::core::{PredictionOutput, Result};
use crate::data::RawTable;
use crate::output::write_predictions;
use crate::persistence::{load_model, save_model, ModelMetadata};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    ArgsValidated,
    DataLoaded,
    Fitting,
    Loading,
    Trained,
    Predicting,
    Done,
    Failed,
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub model_written: Option<PathBuf>,
    pub predictions_written: Option<PathBuf>,
    pub n_predictions: usize,
}

pub struct Driver<'a> {
    config: &'a RunConfig,
    state: DriverState,
    history: Vec<DriverState>,
}

impl<'a> Driver<'a> {
    /// Start a driver for an already validated configuration
    pub fn new(config: &'a RunConfig) -> Self {
        let mut driver = Self {
            config,
            state: DriverState::Idle,
            history: vec![DriverState::Idle],
        };
        driver.transition(DriverState::ArgsValidated);
        driver
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Every state visited so far, in order
    pub fn history(&self) -> &[DriverState] {
        &self.history
    }

    fn transition(&mut self, next: DriverState) {
        debug!("Driver state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Execute the configured mode
    pub fn run(&mut self) -> Result<RunOutcome> {
        info!("Running in {} mode", self.config.mode.name());
        match self.execute() {
            Ok(outcome) => {
                self.transition(DriverState::Done);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(DriverState::Failed);
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<RunOutcome> {
        let config = self.config;
        match &config.mode {
            RunMode::Fit {
                train_data,
                model_out,
            } => {
                let train = load_table(train_data)?;
                self.transition(DriverState::DataLoaded);

                let pipeline = self.fit(&train)?;
                save(&pipeline, model_out)?;
                Ok(RunOutcome {
                    model_written: Some(model_out.clone()),
                    predictions_written: None,
                    n_predictions: 0,
                })
            }
            RunMode::Predict {
                model_in,
                test_data,
                predictions_out,
            } => {
                let test = load_table(test_data)?;
                self.transition(DriverState::DataLoaded);

                self.transition(DriverState::Loading);
                let saved = load_model(model_in)?;
                info!(
                    "Loaded {} {} model created {}",
                    saved.metadata.estimator, saved.metadata.problem, saved.metadata.created_at
                );
                if saved.metadata.problem != config.problem {
                    warn!(
                        "Model was fitted for {}, requested {}; using the model's problem type",
                        saved.metadata.problem, config.problem
                    );
                }

                let predictions = self.predict(&saved.pipeline, &test, predictions_out)?;
                Ok(RunOutcome {
                    model_written: None,
                    predictions_written: Some(predictions_out.clone()),
                    n_predictions: predictions.len(),
                })
            }
            RunMode::FitAndPredict {
                train_data,
                test_data,
                model_out,
                predictions_out,
            } => {
                let train = load_table(train_data)?;
                let test = load_table(test_data)?;
                self.transition(DriverState::DataLoaded);

                let pipeline = self.fit(&train)?;
                if let Some(path) = model_out {
                    save(&pipeline, path)?;
                }

                let predictions = self.predict(&pipeline, &test, predictions_out)?;
                Ok(RunOutcome {
                    model_written: model_out.clone(),
                    predictions_written: Some(predictions_out.clone()),
                    n_predictions: predictions.len(),
                })
            }
        }
    }

    fn fit(&mut self, train: &RawTable) -> Result<TrainedPipeline> {
        self.transition(DriverState::Fitting);
        let config = self.config;
        let pipeline = Learner::new(config.problem)
            .with_targets(config.targets.clone())
            .with_impute(config.impute)
            .with_estimator(config.estimator.clone())
            .with_seed(config.seed)
            .fit(train)?;
        self.transition(DriverState::Trained);
        Ok(pipeline)
    }

    fn predict(
        &mut self,
        pipeline: &TrainedPipeline,
        test: &RawTable,
        out: &Path,
    ) -> Result<PredictionOutput> {
        self.transition(DriverState::Predicting);
        let predictions = pipeline.predict(test, self.config.probabilities)?;
        write_predictions(out, &predictions)?;
        Ok(predictions)
    }
}

fn load_table(path: &Path) -> Result<RawTable> {
    let table = RawTable::from_file(path)?;
    info!(
        "Loaded {:?}: relation '{}', {} rows, {} columns ({:?})",
        path,
        table.relation(),
        table.len(),
        table.n_columns(),
        table.format()
    );
    Ok(table)
}

fn save(pipeline: &TrainedPipeline, path: &Path) -> Result<()> {
    let metadata = ModelMetadata::for_pipeline(pipeline);
    save_model(pipeline, &metadata, path)?;
    info!("Model saved to {:?}", path);
    Ok(())
}

/// Run one invocation described by `config`
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    Driver::new(config).run()
}
