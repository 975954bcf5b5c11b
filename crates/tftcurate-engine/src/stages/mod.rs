//! Collaborator stages around the collection core.
//!
//! Each stage reads its declared inputs, writes its declared outputs,
//! and nothing else; the orchestrator owns skip logic and failure
//! propagation.

pub mod backup;
pub mod cross_cycle;
pub mod parquet;
pub mod quality;
pub mod transform;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Read and decode a JSON artifact or report.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let body = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&body)
        .with_context(|| format!("failed to decode {}", path.display()))
}

/// Write a JSON document, creating parent directories.
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_vec_pretty(value).context("serialization failed")?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}
