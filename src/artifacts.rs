use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::models::DeploymentDescriptor;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0} has no non-empty abi array")]
    MissingAbi(PathBuf),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ArtifactError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Reads the `{address, network}` file written by the deploy script.
pub fn load_deployment(path: &Path) -> Result<DeploymentDescriptor, ArtifactError> {
    read_json(path)
}

/// Reads a compiled contract artifact and returns its `abi` array untouched.
pub fn load_contract_abi(path: &Path) -> Result<Value, ArtifactError> {
    let mut artifact: Value = read_json(path)?;

    let abi = artifact.get_mut("abi").map(Value::take).unwrap_or_default();

    if abi.as_array().map_or(false, |entries| !entries.is_empty()) {
        Ok(abi)
    } else {
        Err(ArtifactError::MissingAbi(path.to_owned()))
    }
}
