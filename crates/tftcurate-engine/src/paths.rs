//! Deterministic per-cycle output paths.
//!
//! Every stage declares its inputs and outputs in terms of these paths;
//! the orchestrator's skip logic and the provenance assembler both key
//! off them.

use std::path::{Path, PathBuf};

use tftcurate_types::ids::CycleId;

/// Path layout for one cycle under a data root.
#[derive(Debug, Clone)]
pub struct CyclePaths {
    root: PathBuf,
    cycle: CycleId,
}

impl CyclePaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, cycle: CycleId) -> Self {
        Self {
            root: root.into(),
            cycle,
        }
    }

    /// Data root all paths hang off.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cycle these paths belong to.
    #[must_use]
    pub fn cycle(&self) -> &CycleId {
        &self.cycle
    }

    /// `data/raw/tft_collection_<cycle>.json`
    #[must_use]
    pub fn raw(&self) -> PathBuf {
        self.root
            .join("data/raw")
            .join(format!("tft_collection_{}.json", self.cycle))
    }

    /// `data/raw/tft_collection_<cycle>_checkpoint.json` (transient)
    #[must_use]
    pub fn checkpoint(&self) -> PathBuf {
        self.root
            .join("data/raw")
            .join(format!("tft_collection_{}_checkpoint.json", self.cycle))
    }

    /// `data/validated/tft_collection_<cycle>.json`
    #[must_use]
    pub fn validated(&self) -> PathBuf {
        self.root
            .join("data/validated")
            .join(format!("tft_collection_{}.json", self.cycle))
    }

    /// `data/transformed/tft_collection_<cycle>.jsonld`
    #[must_use]
    pub fn transformed(&self) -> PathBuf {
        self.root
            .join("data/transformed")
            .join(format!("tft_collection_{}.jsonld", self.cycle))
    }

    /// `data/parquet/<cycle>/`
    #[must_use]
    pub fn parquet_dir(&self) -> PathBuf {
        self.root.join("data/parquet").join(self.cycle.as_str())
    }

    /// `data/parquet/<cycle>/matches.parquet`
    #[must_use]
    pub fn parquet_matches(&self) -> PathBuf {
        self.parquet_dir().join("matches.parquet")
    }

    /// `data/parquet/<cycle>/participants.parquet`
    #[must_use]
    pub fn parquet_participants(&self) -> PathBuf {
        self.parquet_dir().join("participants.parquet")
    }

    /// `reports/validation_<cycle>.json`
    #[must_use]
    pub fn validation_report(&self) -> PathBuf {
        self.root
            .join("reports")
            .join(format!("validation_{}.json", self.cycle))
    }

    /// `reports/quality_<cycle>.json`
    #[must_use]
    pub fn quality_report(&self) -> PathBuf {
        self.root
            .join("reports")
            .join(format!("quality_{}.json", self.cycle))
    }

    /// `reports/cross_cycle_<cycle>.json`
    #[must_use]
    pub fn cross_cycle_report(&self) -> PathBuf {
        self.root
            .join("reports")
            .join(format!("cross_cycle_{}.json", self.cycle))
    }

    /// `provenance/workflow_<cycle>.prov.json`
    #[must_use]
    pub fn provenance(&self) -> PathBuf {
        self.root
            .join("provenance")
            .join(format!("workflow_{}.prov.json", self.cycle))
    }

    /// `backups/backup_<cycle>.tar.gz`
    #[must_use]
    pub fn backup(&self) -> PathBuf {
        self.root
            .join("backups")
            .join(format!("backup_{}.tar.gz", self.cycle))
    }

    /// `backups/backup_<cycle>_metadata.json`
    #[must_use]
    pub fn backup_metadata(&self) -> PathBuf {
        self.root
            .join("backups")
            .join(format!("backup_{}_metadata.json", self.cycle))
    }

    /// `backups/` directory, for retention cleanup.
    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// `logs/collection_<cycle>.log`
    #[must_use]
    pub fn log(&self) -> PathBuf {
        self.root
            .join("logs")
            .join(format!("collection_{}.log", self.cycle))
    }

    /// `state/identifier_registry.db`, shared across cycles.
    #[must_use]
    pub fn registry_db(&self) -> PathBuf {
        self.root.join("state").join("identifier_registry.db")
    }

    /// `data/validated/` directory, scanned for prior cycles.
    #[must_use]
    pub fn validated_dir(&self) -> PathBuf {
        self.root.join("data/validated")
    }
}
