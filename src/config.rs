//! Command-line surface and the validated run configuration
//!
//! [`CliArgs`] mirrors the flags the orchestrator passes, including the legacy
//! spellings. [`RunConfig::from_cli`] resolves aliases and fallbacks once and
//! rejects inconsistent combinations before any file is touched.

use crate::core::{ProblemType, Result, RunnerError};
use crate::data::{ImputeStrategy, TargetSelection};
use crate::estimator::{EstimatorKind, EstimatorSpec};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default address-space ceiling: 4 GiB
pub const DEFAULT_MEMORY_LIMIT: u64 = 4 * 1024 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "arffml")]
#[command(about = "Fit and apply ARFF pipelines for an external AutoML orchestrator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct CliArgs {
    /// Run mode
    #[arg(long, value_enum)]
    pub mode: CliMode,

    /// Training data (ARFF); in test mode, the data to predict on
    #[arg(long, alias = "fit")]
    pub arff: Option<PathBuf>,

    /// Test data (ARFF)
    #[arg(long = "testarff", alias = "predict")]
    pub testarff: Option<PathBuf>,

    /// Model file in train mode, prediction file otherwise
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Where to write the fitted model
    #[arg(long = "fitOutput")]
    pub fit_output: Option<PathBuf>,

    /// Where to write predictions
    #[arg(long = "predictOutput")]
    pub predict_output: Option<PathBuf>,

    /// Model file to write (fit modes) or read (predict mode)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Shorthand for --problem regression
    #[arg(long, conflicts_with = "problem")]
    pub regression: bool,

    /// Learning problem type
    #[arg(long, value_enum)]
    pub problem: Option<CliProblem>,

    /// Target column indices, space separated
    #[arg(long, num_args = 1..)]
    pub targets: Vec<String>,

    /// Seed recorded in the model metadata
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub seed: i64,

    /// Estimator back-end
    #[arg(long, value_enum, default_value = "knn")]
    pub estimator: CliEstimator,

    /// Neighbour count for knn
    #[arg(long, default_value_t = 5)]
    pub neighbors: usize,

    /// Regularization strength for ridge
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Replacement for missing numeric feature values
    #[arg(long, value_enum, default_value = "mean")]
    pub impute: CliImpute,

    /// Write hard predictions even when probabilities are available
    #[arg(long)]
    pub labels_only: bool,

    /// Address-space ceiling in bytes, 0 disables it
    #[arg(long, env = "ARFFML_MEMORY_LIMIT", default_value_t = DEFAULT_MEMORY_LIMIT)]
    pub memory_limit: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliMode {
    /// Fit and save a model
    #[value(name = "train", alias = "fit")]
    Train,
    /// Load a model and predict
    #[value(name = "test", alias = "predict")]
    Test,
    /// Fit, optionally save, and predict
    #[value(name = "traintest", aliases = ["trainAndPredict", "fitAndPredict"])]
    TrainTest,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliProblem {
    #[value(name = "classification")]
    Classification,
    #[value(name = "regression")]
    Regression,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliEstimator {
    /// k nearest neighbours
    #[value(name = "knn")]
    Knn,
    /// Ridge least squares
    #[value(name = "ridge")]
    Ridge,
    /// Class priors / target means
    #[value(name = "dummy")]
    Dummy,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliImpute {
    #[value(name = "mean")]
    Mean,
    #[value(name = "zero")]
    Zero,
}

impl From<CliEstimator> for EstimatorKind {
    fn from(cli: CliEstimator) -> Self {
        match cli {
            CliEstimator::Knn => EstimatorKind::Knn,
            CliEstimator::Ridge => EstimatorKind::Ridge,
            CliEstimator::Dummy => EstimatorKind::Dummy,
        }
    }
}

impl From<CliImpute> for ImputeStrategy {
    fn from(cli: CliImpute) -> Self {
        match cli {
            CliImpute::Mean => ImputeStrategy::Mean,
            CliImpute::Zero => ImputeStrategy::Zero,
        }
    }
}

impl From<CliProblem> for ProblemType {
    fn from(cli: CliProblem) -> Self {
        match cli {
            CliProblem::Classification => ProblemType::Classification,
            CliProblem::Regression => ProblemType::Regression,
        }
    }
}

/// What the run does, after alias resolution
#[derive(Clone, Debug, PartialEq)]
pub enum RunMode {
    /// Fit on `train_data` and save the model
    Fit { train_data: PathBuf, model_out: PathBuf },
    /// Load `model_in` and predict on `test_data`
    Predict {
        model_in: PathBuf,
        test_data: PathBuf,
        predictions_out: PathBuf,
    },
    /// Fit, optionally save, then predict
    FitAndPredict {
        train_data: PathBuf,
        test_data: PathBuf,
        model_out: Option<PathBuf>,
        predictions_out: PathBuf,
    },
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Fit { .. } => "fit",
            RunMode::Predict { .. } => "predict",
            RunMode::FitAndPredict { .. } => "fitAndPredict",
        }
    }
}

/// Immutable, validated configuration of one run
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub mode: RunMode,
    pub problem: ProblemType,
    pub targets: TargetSelection,
    pub seed: i64,
    pub estimator: EstimatorSpec,
    pub impute: ImputeStrategy,
    /// Request class probabilities when the estimator supports them
    pub probabilities: bool,
    /// Address-space ceiling in bytes
    pub memory_limit: Option<u64>,
}

fn required(value: Option<PathBuf>, what: &str, mode: &str) -> Result<PathBuf> {
    value.ok_or_else(|| RunnerError::Argument(format!("{what} is required in {mode} mode")))
}

/// Parse `--targets` values; each value may itself hold several indices
pub fn parse_targets(values: &[String]) -> Result<TargetSelection> {
    let mut indices = Vec::new();
    for token in values.iter().flat_map(|v| v.split_whitespace()) {
        let index = token.parse::<usize>().map_err(|_| {
            RunnerError::Argument(format!("Invalid target index '{token}'"))
        })?;
        indices.push(index);
    }
    if indices.is_empty() {
        Ok(TargetSelection::Default)
    } else {
        Ok(TargetSelection::Explicit(indices))
    }
}

impl RunConfig {
    /// Resolve aliases and fallbacks, then validate
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mode = match args.mode {
            CliMode::Train => {
                let train_data = required(args.arff.clone(), "--arff", "train")?;
                let model_out = args
                    .model
                    .clone()
                    .or_else(|| args.fit_output.clone())
                    .or_else(|| args.output.clone());
                RunMode::Fit {
                    train_data,
                    model_out: required(model_out, "--model (or --fitOutput/--output)", "train")?,
                }
            }
            CliMode::Test => {
                let model_in = required(args.model.clone(), "--model", "test")?;
                let test_data = args.testarff.clone().or_else(|| args.arff.clone());
                let predictions_out = args
                    .predict_output
                    .clone()
                    .or_else(|| args.output.clone());
                RunMode::Predict {
                    model_in,
                    test_data: required(test_data, "--testarff (or --arff)", "test")?,
                    predictions_out: required(
                        predictions_out,
                        "--predictOutput (or --output)",
                        "test",
                    )?,
                }
            }
            CliMode::TrainTest => {
                let train_data = required(args.arff.clone(), "--arff", "traintest")?;
                let test_data = required(args.testarff.clone(), "--testarff", "traintest")?;
                let model_out = args.model.clone().or_else(|| args.fit_output.clone());
                let predictions_out = args
                    .predict_output
                    .clone()
                    .or_else(|| args.output.clone());
                RunMode::FitAndPredict {
                    train_data,
                    test_data,
                    model_out,
                    predictions_out: required(
                        predictions_out,
                        "--predictOutput (or --output)",
                        "traintest",
                    )?,
                }
            }
        };

        let problem = match (args.regression, args.problem) {
            (true, _) => ProblemType::Regression,
            (false, Some(p)) => p.into(),
            (false, None) => ProblemType::Classification,
        };

        let targets = parse_targets(&args.targets)?;
        if problem == ProblemType::Classification {
            if let TargetSelection::Explicit(indices) = &targets {
                if indices.len() != 1 {
                    return Err(RunnerError::Argument(
                        "Multiple targets are not supported for classification".to_string(),
                    ));
                }
            }
        }

        if args.neighbors == 0 {
            return Err(RunnerError::Argument(
                "--neighbors must be at least 1".to_string(),
            ));
        }
        if !args.alpha.is_finite() || args.alpha < 0.0 {
            return Err(RunnerError::Argument(format!(
                "--alpha must be a non-negative number, got {}",
                args.alpha
            )));
        }

        let estimator = EstimatorSpec::new(args.estimator.into())
            .with_neighbors(args.neighbors)
            .with_alpha(args.alpha);

        Ok(Self {
            mode,
            problem,
            targets,
            seed: args.seed,
            estimator,
            impute: args.impute.into(),
            probabilities: !args.labels_only,
            memory_limit: (args.memory_limit > 0).then_some(args.memory_limit),
        })
    }
}
