//! Integration tests for the arffml library
//!
//! These tests exercise the path from ARFF text through preprocessing,
//! fitting, persistence and prediction output.

use approx::assert_relative_eq;
use arffml::data::{ImputeStrategy, Preprocessor, RawTable, TargetSelection};
use arffml::estimator::{EstimatorKind, EstimatorSpec};
use arffml::output::serialize_predictions;
use arffml::persistence::{from_bytes, load_model, save_model, to_bytes, ModelMetadata};
use arffml::{Learner, PredictionOutput, ProblemType, RunnerError};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const WEATHER: &str = "% weather data\n\
    @RELATION weather\n\
    @ATTRIBUTE temperature NUMERIC\n\
    @ATTRIBUTE humidity REAL\n\
    @ATTRIBUTE outlook {sunny, overcast, rainy}\n\
    @ATTRIBUTE class {play, stay}\n\
    @DATA\n\
    30, 85, sunny, stay\n\
    28, 90, sunny, stay\n\
    21, ?, overcast, play\n\
    18, 70, rainy, play\n\
    20, 65, overcast, play\n\
    31, 95, sunny, stay\n";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write");
    file.flush().expect("Failed to flush");
    file
}

fn fit_default(text: &str, problem: ProblemType, targets: TargetSelection) -> arffml::ParsedDataset {
    let table: RawTable = text.parse().expect("valid ARFF");
    let (_, dataset) = Preprocessor::fit(&table, problem, &targets, ImputeStrategy::Mean)
        .expect("preprocessing should succeed");
    dataset
}

#[test]
fn test_dense_classification_one_hot() {
    let dataset = fit_default(
        "@relation a\n\
         @attribute f1 numeric\n@attribute f2 numeric\n@attribute f3 numeric\n\
         @attribute class {A, B}\n\
         @data\n1.0, 2.0, 3.0, A\n4.0, 5.0, 6.0, B\n",
        ProblemType::Classification,
        TargetSelection::Default,
    );

    assert_eq!(dataset.features.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    assert_eq!(dataset.targets.to_rows(), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[test]
fn test_sparse_row_defaults_to_zero() {
    let dataset = fit_default(
        "@relation s\n\
         @attribute f0 numeric\n@attribute f1 numeric\n\
         @attribute f2 numeric\n@attribute f3 numeric\n\
         @attribute class {A, B}\n\
         @data\n{0 1.5, 2 3.0, 4 B}\n{1 2.0}\n",
        ProblemType::Classification,
        TargetSelection::Default,
    );

    assert_eq!(dataset.features.row(0), &[1.5, 0.0, 3.0, 0.0]);
    assert_eq!(dataset.features.row(1), &[0.0, 2.0, 0.0, 0.0]);
    // omitted nominal class takes the first label of its domain
    assert_eq!(dataset.class_indices, Some(vec![1, 0]));
}

#[test]
fn test_explicit_regression_targets() {
    let dataset = fit_default(
        "@relation r\n\
         @attribute c0 numeric\n@attribute c1 numeric\n@attribute c2 numeric\n\
         @attribute c3 numeric\n@attribute c4 numeric\n\
         @data\n10, 11, 12, 13, 14\n20, 21, 22, 23, 24\n",
        ProblemType::Regression,
        TargetSelection::Explicit(vec![2, 4]),
    );

    assert_eq!(dataset.targets.to_rows(), vec![vec![12.0, 14.0], vec![22.0, 24.0]]);
    assert_eq!(dataset.features.to_rows(), vec![vec![10.0, 11.0, 13.0], vec![20.0, 21.0, 23.0]]);
}

#[test]
fn test_preprocessing_invariants() {
    let dataset = fit_default(WEATHER, ProblemType::Classification, TargetSelection::Default);

    // one-hot rows
    for row in dataset.targets.iter_rows() {
        assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
        assert_eq!(row.iter().sum::<f64>(), 1.0);
    }

    // no missing values remain; humidity mean uses all six rows
    assert!(dataset.features.as_slice().iter().all(|v| v.is_finite()));
    assert_relative_eq!(dataset.features.get(2, 1), (85.0 + 90.0 + 70.0 + 65.0 + 95.0) / 6.0);
    assert_eq!(dataset.imputed_cells, 1);

    // temperature, humidity, then outlook indicators in lexical order
    assert_eq!(dataset.features.cols(), 5);
    assert_eq!(dataset.features.row(0), &[30.0, 85.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_unseen_category_encodes_as_zeros() {
    let table: RawTable = WEATHER.parse().unwrap();
    let (pre, _) = Preprocessor::fit(
        &table,
        ProblemType::Classification,
        &TargetSelection::Default,
        ImputeStrategy::Mean,
    )
    .unwrap();

    let test: RawTable = "@relation weather\n\
        @attribute temperature numeric\n@attribute humidity numeric\n\
        @attribute outlook {sunny, overcast, rainy, foggy}\n\
        @attribute class {play, stay}\n\
        @data\n15, 99, foggy, ?\n"
        .parse()
        .unwrap();
    let features = pre.transform(&test).unwrap();
    assert_eq!(features.row(0), &[15.0, 99.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_parsing_is_idempotent() {
    let first: RawTable = WEATHER.parse().unwrap();
    let second: RawTable = WEATHER.parse().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_train_save_load_predict() {
    let train = write_temp(WEATHER);
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("weather.model");

    let pipeline = Learner::classification()
        .with_estimator(EstimatorSpec::new(EstimatorKind::Knn).with_neighbors(3))
        .with_seed(11)
        .fit_from_file(train.path())
        .expect("Training should succeed");
    let metadata = ModelMetadata::for_pipeline(&pipeline);
    save_model(&pipeline, &metadata, &model_path).expect("Saving should succeed");

    let loaded = load_model(&model_path).expect("Loading should succeed");
    assert_eq!(loaded.metadata.seed, 11);
    assert_eq!(loaded.metadata.n_training_rows, 6);
    assert_eq!(loaded.metadata.problem, ProblemType::Classification);

    let before = pipeline.predict_from_file(train.path(), true).unwrap();
    let after = loaded.pipeline.predict_from_file(train.path(), true).unwrap();
    match (before, after) {
        (PredictionOutput::Probabilities(a), PredictionOutput::Probabilities(b)) => {
            assert_eq!(a.rows(), 6);
            for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-9);
            }
        }
        other => panic!("expected probabilities, got {other:?}"),
    }
}

#[test]
fn test_regression_round_trip() {
    let text = "@relation lin\n@attribute x numeric\n@attribute y numeric\n\
        @data\n0, 1\n1, 3\n2, 5\n3, 7\n";
    let table: RawTable = text.parse().unwrap();
    let pipeline = Learner::regression()
        .with_estimator(EstimatorSpec::new(EstimatorKind::Ridge).with_alpha(0.0))
        .fit(&table)
        .unwrap();

    let bytes = to_bytes(&pipeline, &ModelMetadata::for_pipeline(&pipeline)).unwrap();
    let restored = from_bytes(&bytes).unwrap().pipeline;

    let query: RawTable = "@relation lin\n@attribute x numeric\n@attribute y numeric\n\
        @data\n10, ?\n"
        .parse()
        .unwrap();
    match restored.predict(&query, true).unwrap() {
        PredictionOutput::Values(v) => assert_relative_eq!(v.get(0, 0), 21.0, epsilon = 1e-9),
        other => panic!("expected values, got {other:?}"),
    }
}

#[test]
fn test_probability_fallback_for_ridge() {
    let table: RawTable = WEATHER.parse().unwrap();
    let pipeline = Learner::classification()
        .with_estimator(EstimatorSpec::new(EstimatorKind::Ridge))
        .fit(&table)
        .unwrap();

    let out = pipeline.predict(&table, true).unwrap();
    assert!(matches!(out, PredictionOutput::Labels(ref l) if l.len() == 6));
}

#[test]
fn test_corrupted_model_file() {
    let table: RawTable = WEATHER.parse().unwrap();
    let pipeline = Learner::classification().fit(&table).unwrap();
    let mut bytes = to_bytes(&pipeline, &ModelMetadata::for_pipeline(&pipeline)).unwrap();
    let middle = bytes.len() - 16;
    bytes[middle] = bytes[middle].wrapping_add(1);

    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), &bytes).unwrap();
    assert!(matches!(
        load_model(file.path()),
        Err(RunnerError::Serialization(_))
    ));
}

#[test]
fn test_integer_predictions_format() {
    let out = serialize_predictions(&PredictionOutput::Labels(vec![1, 0, 1])).unwrap();
    assert_eq!(out, "[[1.0], [0.0], [1.0]]");
}

#[test]
fn test_parse_errors_report_line() {
    let err = "@relation bad\n@attribute a numeric\n@attribute b numeric\n@data\n1, 2\n3\n"
        .parse::<RawTable>()
        .unwrap_err();
    match err {
        RunnerError::Parse(msg) => assert!(msg.contains("line 6"), "message was: {msg}"),
        other => panic!("expected parse error, got {other:?}"),
    }
}
