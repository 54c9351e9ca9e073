//! Model serialization and persistence
//!
//! A model file is a bincode envelope holding metadata, an FNV-1a checksum and
//! the bincode-encoded [`TrainedPipeline`]. Files are written to a temporary
//! file in the destination directory and renamed into place.

use crate::api::TrainedPipeline;
use crate::core::{ProblemType, Result, RunnerError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Model metadata for tracking and validation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub estimator: String,
    pub problem: ProblemType,
    pub seed: i64,
    /// Encoded feature width
    pub n_features: usize,
    pub n_training_rows: usize,
}

impl ModelMetadata {
    /// Describe a fitted pipeline, stamped with the current time
    pub fn for_pipeline(pipeline: &TrainedPipeline) -> Self {
        let info = pipeline.info();
        Self {
            library_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            estimator: info.estimator,
            problem: info.problem,
            seed: info.seed,
            n_features: info.n_features,
            n_training_rows: info.n_training_rows,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    metadata: ModelMetadata,
    checksum: u64,
    payload: Vec<u8>,
}

/// A pipeline read back from disk
#[derive(Debug, Clone)]
pub struct SavedModel {
    pub metadata: ModelMetadata,
    pub pipeline: TrainedPipeline,
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn serialization_error(e: impl std::fmt::Display) -> RunnerError {
    RunnerError::Serialization(e.to_string())
}

/// Encode a pipeline and its metadata into the model file format
pub fn to_bytes(pipeline: &TrainedPipeline, metadata: &ModelMetadata) -> Result<Vec<u8>> {
    let payload = bincode::serialize(pipeline).map_err(serialization_error)?;
    let envelope = ModelEnvelope {
        metadata: metadata.clone(),
        checksum: fnv1a(&payload),
        payload,
    };
    bincode::serialize(&envelope).map_err(serialization_error)
}

/// Decode a model file, verifying its checksum
pub fn from_bytes(bytes: &[u8]) -> Result<SavedModel> {
    let envelope: ModelEnvelope = bincode::deserialize(bytes)
        .map_err(|e| RunnerError::Serialization(format!("unreadable model file: {e}")))?;

    let checksum = fnv1a(&envelope.payload);
    if checksum != envelope.checksum {
        return Err(RunnerError::Serialization(format!(
            "model checksum mismatch: stored {:016x}, computed {:016x}",
            envelope.checksum, checksum
        )));
    }

    let pipeline: TrainedPipeline =
        bincode::deserialize(&envelope.payload).map_err(serialization_error)?;

    let metadata = envelope.metadata;
    if metadata.n_features != pipeline.preprocessor().feature_width() {
        return Err(RunnerError::Serialization(format!(
            "metadata records {} features but the pipeline expects {}",
            metadata.n_features,
            pipeline.preprocessor().feature_width()
        )));
    }
    if metadata.library_version != env!("CARGO_PKG_VERSION") {
        warn!(
            "Model was written by version {}, running {}",
            metadata.library_version,
            env!("CARGO_PKG_VERSION")
        );
    }

    Ok(SavedModel { metadata, pipeline })
}

/// Save a fitted pipeline to `path`
pub fn save_model<P: AsRef<Path>>(
    pipeline: &TrainedPipeline,
    metadata: &ModelMetadata,
    path: P,
) -> Result<()> {
    let bytes = to_bytes(pipeline, metadata)?;
    write_atomically(path.as_ref(), &bytes)?;
    debug!("Wrote {} byte model to {:?}", bytes.len(), path.as_ref());
    Ok(())
}

/// Load a pipeline saved with [`save_model`]
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<SavedModel> {
    let bytes = fs::read(path.as_ref())?;
    from_bytes(&bytes)
}

/// Write `bytes` to `path` via a temporary sibling file and a rename
///
/// Readers never observe a partially written file.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| RunnerError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Learner;
    use crate::data::RawTable;
    use tempfile::TempDir;

    fn pipeline() -> TrainedPipeline {
        let table: RawTable = "@relation p\n\
            @attribute a numeric\n@attribute b {x, y}\n@attribute class {neg, pos}\n\
            @data\n1, x, neg\n2, x, neg\n8, y, pos\n9, ?, pos\n"
            .parse()
            .unwrap();
        Learner::classification().with_seed(3).fit(&table).unwrap()
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let pipeline = pipeline();
        let metadata = ModelMetadata::for_pipeline(&pipeline);

        save_model(&pipeline, &metadata, &path).unwrap();
        let loaded = load_model(&path).unwrap();

        assert_eq!(loaded.pipeline, pipeline);
        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.metadata.seed, 3);
        assert_eq!(loaded.metadata.estimator, "knn");
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded.metadata.created_at).is_ok());
    }

    #[test]
    fn test_corrupted_payload_is_rejected() {
        let pipeline = pipeline();
        let mut bytes = to_bytes(&pipeline, &ModelMetadata::for_pipeline(&pipeline)).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            from_bytes(&bytes),
            Err(RunnerError::Serialization(_))
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            from_bytes(b"not a model"),
            Err(RunnerError::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_model(dir.path().join("absent.bin")),
            Err(RunnerError::Io(_))
        ));
    }

    #[test]
    fn test_write_atomically_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        write_atomically(&path, b"first").unwrap();
        write_atomically(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
    }
}
