//! Prediction file serialization
//!
//! Predictions are written as a JSON array with one inner array of floats per
//! instance, using `, ` between elements: `[[1.0], [0.0], [1.0]]`.

use crate::core::{PredictionOutput, Result, RunnerError};
use crate::persistence::write_atomically;
use log::info;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;
use std::path::Path;

/// Compact JSON with a space after every separator
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// One row of floats per instance
pub fn prediction_rows(predictions: &PredictionOutput) -> Vec<Vec<f64>> {
    match predictions {
        PredictionOutput::Labels(labels) => labels.iter().map(|&l| vec![l as f64]).collect(),
        PredictionOutput::Values(m) | PredictionOutput::Probabilities(m) => m.to_rows(),
    }
}

/// Render predictions in the prediction file format
///
/// Non-finite values are written as `null`.
pub fn serialize_predictions(predictions: &PredictionOutput) -> Result<String> {
    let rows = prediction_rows(predictions);
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    rows.serialize(&mut serializer)
        .map_err(|e| RunnerError::Serialization(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| RunnerError::Serialization(e.to_string()))
}

/// Serialize predictions and write them atomically to `path`
pub fn write_predictions<P: AsRef<Path>>(path: P, predictions: &PredictionOutput) -> Result<()> {
    let text = serialize_predictions(predictions)?;
    write_atomically(path.as_ref(), text.as_bytes())?;
    info!(
        "Wrote {} predictions to {:?}",
        predictions.len(),
        path.as_ref()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Matrix;
    use tempfile::TempDir;

    #[test]
    fn test_labels_become_float_rows() {
        let out = serialize_predictions(&PredictionOutput::Labels(vec![1, 0, 1])).unwrap();
        assert_eq!(out, "[[1.0], [0.0], [1.0]]");
    }

    #[test]
    fn test_probability_rows() {
        let probabilities = Matrix::from_rows(&[vec![0.25, 0.75], vec![1.0, 0.0]]).unwrap();
        let out = serialize_predictions(&PredictionOutput::Probabilities(probabilities)).unwrap();
        assert_eq!(out, "[[0.25, 0.75], [1.0, 0.0]]");
    }

    #[test]
    fn test_regression_values() {
        let values = Matrix::from_rows(&[vec![-1.5, 2.0]]).unwrap();
        let out = serialize_predictions(&PredictionOutput::Values(values)).unwrap();
        assert_eq!(out, "[[-1.5, 2.0]]");
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert_eq!(
            serialize_predictions(&PredictionOutput::Labels(Vec::new())).unwrap(),
            "[]"
        );
        let values = Matrix::column_vector(vec![f64::NAN]);
        assert_eq!(
            serialize_predictions(&PredictionOutput::Values(values)).unwrap(),
            "[[null]]"
        );
    }

    #[test]
    fn test_output_parses_as_json() {
        let out = serialize_predictions(&PredictionOutput::Labels(vec![2, 0])).unwrap();
        let parsed: Vec<Vec<f64>> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, vec![vec![2.0], vec![0.0]]);
    }

    #[test]
    fn test_write_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("predictions.json");
        write_predictions(&path, &PredictionOutput::Labels(vec![1])).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[[1.0]]");
    }
}
