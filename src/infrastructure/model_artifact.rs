//! On-disk format for trained pricing models.
//!
//! A model file is a single JSON document carrying a format tag and version,
//! the regressor kind, the scaling vectors, the hold-out metrics and the
//! serialized regressor. The header is checked before the body is decoded.

use crate::domain::ml::{ScalingParameters, TrainingMetrics};
use crate::infrastructure::atomic_file::write_atomic;
use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const ARTIFACT_FORMAT: &str = "pricewise-model";
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactHeader {
    pub format: String,
    pub version: u32,
    pub regressor_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifactFile<R> {
    pub format: String,
    pub version: u32,
    pub regressor_kind: String,
    pub scaling: ScalingParameters,
    pub metrics: TrainingMetrics,
    pub regressor: R,
}

impl<R> ModelArtifactFile<R> {
    pub fn new(
        regressor_kind: &str,
        scaling: ScalingParameters,
        metrics: TrainingMetrics,
        regressor: R,
    ) -> Self {
        Self {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            regressor_kind: regressor_kind.to_string(),
            scaling,
            metrics,
            regressor,
        }
    }
}

pub fn write_artifact<R: Serialize>(path: &Path, artifact: &ModelArtifactFile<R>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create model directory")?;
        }
    }

    let content = serde_json::to_vec(artifact).context("Failed to serialize model")?;

    write_atomic(path, content).context("Failed to write model file")?;

    info!("Model saved to {:?}", path);
    Ok(())
}

/// Reads and decodes a model file, rejecting foreign formats, unknown
/// versions and other regressor kinds before decoding the body.
pub fn read_artifact<R: DeserializeOwned>(
    path: &Path,
    expected_kind: &str,
) -> Result<ModelArtifactFile<R>> {
    let bytes = fs::read(path).context("Failed to read model file")?;

    let header: ArtifactHeader =
        serde_json::from_slice(&bytes).context("Model file has no valid header")?;
    if header.format != ARTIFACT_FORMAT {
        bail!("unrecognized model format '{}'", header.format);
    }
    if header.version != ARTIFACT_VERSION {
        bail!(
            "unsupported model version {} (expected {})",
            header.version,
            ARTIFACT_VERSION
        );
    }
    if header.regressor_kind != expected_kind {
        bail!(
            "model holds a '{}' regressor, expected '{}'",
            header.regressor_kind,
            expected_kind
        );
    }

    serde_json::from_slice(&bytes).context("Failed to parse model body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_artifact() -> ModelArtifactFile<Vec<f64>> {
        ModelArtifactFile::new(
            "constant",
            ScalingParameters {
                mean: vec![0.0; 6],
                std: vec![1.0; 6],
            },
            TrainingMetrics::evaluate(&[1.0], &[1.0], Utc::now()),
            vec![4.2],
        )
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.json");

        write_artifact(&path, &sample_artifact()).unwrap();
        let restored: ModelArtifactFile<Vec<f64>> = read_artifact(&path, "constant").unwrap();
        assert_eq!(restored.regressor, vec![4.2]);
        assert_eq!(restored.version, ARTIFACT_VERSION);
        assert!(!path.with_file_name("model.json.tmp").exists());
    }

    #[test]
    fn test_rejects_other_kind_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_artifact(&path, &sample_artifact()).unwrap();

        let err = read_artifact::<Vec<f64>>(&path, "random_forest").unwrap_err();
        assert!(err.to_string().contains("random_forest"));

        let mut future = sample_artifact();
        future.version = 9;
        write_artifact(&path, &future).unwrap();
        let err = read_artifact::<Vec<f64>>(&path, "constant").unwrap_err();
        assert!(err.to_string().contains("unsupported model version 9"));
    }

    #[test]
    fn test_rejects_garbage_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        assert!(read_artifact::<Vec<f64>>(&path, "constant").is_err());

        fs::write(&path, b"\x00\x01not json").unwrap();
        assert!(read_artifact::<Vec<f64>>(&path, "constant").is_err());
    }
}
