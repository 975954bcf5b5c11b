//! On-disk checkpoint store.
//!
//! Saves are atomic (write-to-temp then rename) so a crash mid-save never
//! leaves a truncated checkpoint behind. A checkpoint that fails to parse
//! is treated as absent rather than aborting the cycle.

use std::path::{Path, PathBuf};

use tftcurate_types::checkpoint::CheckpointSnapshot;

use crate::errors::EngineError;

/// Atomic save/load/delete for one cycle's checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a checkpoint file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Atomically persist a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Checkpoint`] on I/O failure.
    pub fn save(&self, snapshot: &CheckpointSnapshot) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(EngineError::Checkpoint)?;
        }
        let body = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| EngineError::Infrastructure(anyhow::anyhow!(
                "checkpoint serialization failed: {e}"
            )))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(EngineError::Checkpoint)?;
        std::fs::rename(&tmp, &self.path).map_err(EngineError::Checkpoint)?;

        tracing::debug!(path = %self.path.display(), "Checkpoint saved");
        Ok(())
    }

    /// Load the snapshot if one exists.
    ///
    /// A corrupt checkpoint is logged and ignored so the cycle restarts
    /// cleanly instead of wedging.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Checkpoint`] on I/O failure other than the
    /// file being absent.
    pub fn load(&self) -> Result<Option<CheckpointSnapshot>, EngineError> {
        let body = match std::fs::read(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EngineError::Checkpoint(e)),
        };
        match serde_json::from_slice(&body) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Ignoring unreadable checkpoint: {e}"
                );
                Ok(None)
            }
        }
    }

    /// Remove the checkpoint after a successful cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Checkpoint`] on I/O failure other than the
    /// file being absent.
    pub fn delete(&self) -> Result<(), EngineError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Checkpoint(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tftcurate_types::ids::CycleId;

    fn snapshot() -> CheckpointSnapshot {
        let mut snapshot = CheckpointSnapshot::empty(CycleId::new("20251101").unwrap());
        snapshot.pending_matches.push("LA2_1".into());
        snapshot.matches_collected = 3;
        snapshot
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("raw").join("cp.json"));
        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());

        store.save(&snapshot()).unwrap();
        assert!(store.exists());
        let back = store.load().unwrap().unwrap();
        assert_eq!(back, snapshot());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("cp.json"));
        store.save(&snapshot()).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("cp.json")]);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("cp.json"));
        store.delete().unwrap();
        store.save(&snapshot()).unwrap();
        store.delete().unwrap();
        assert!(!store.exists());
        store.delete().unwrap();
    }

    #[test]
    fn corrupt_checkpoint_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = CheckpointStore::new(path);
        assert!(store.load().unwrap().is_none());
    }
}
