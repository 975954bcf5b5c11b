//! Configuration types for the pipeline YAML.
//!
//! Every section has serde defaults so a minimal file (or none at all,
//! with CLI overrides) still resolves to a runnable configuration.

use std::path::PathBuf;

use serde::de::Deserializer;
use serde::Deserialize;
use tftcurate_types::artifact::{CollectionMethod, IncompleteMatchPolicy};
use tftcurate_types::ids::CycleId;
use tftcurate_types::tier::Tier;

/// One cycle or a list of them; the orchestrator fans out per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSelection(pub Vec<CycleId>);

impl CycleSelection {
    /// The cycles to run, in declaration order.
    #[must_use]
    pub fn cycles(&self) -> &[CycleId] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CycleSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accept a bare date key, a number (unquoted YAML), or a list of
        // either.
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let items = match value {
            serde_yaml::Value::Sequence(seq) => seq,
            other => vec![other],
        };
        let mut cycles = Vec::with_capacity(items.len());
        for item in items {
            let raw = match item {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "collection_date entries must be YYYYMMDD, got {other:?}"
                    )))
                }
            };
            cycles.push(CycleId::new(raw).map_err(serde::de::Error::custom)?);
        }
        Ok(Self(cycles))
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Platform region code (any case; canonicalized on use).
    pub region: String,
    /// Long-window budget (requests per two minutes).
    pub rate_limit: u32,
    /// Short-window budget (requests per second).
    pub requests_per_second: u32,
    /// Override for the platform host base URL (proxies, fixtures).
    pub platform_base: Option<String>,
    /// Override for the regional host base URL (proxies, fixtures).
    pub regional_base: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            region: "LA2".to_string(),
            rate_limit: 100,
            requests_per_second: 20,
            platform_base: None,
            regional_base: None,
        }
    }
}

/// Collector settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionSection {
    /// Window policy: `daily` or `weekly`.
    pub mode: CollectionMethod,
    /// Subset of ranked tiers to enumerate.
    pub tiers: Vec<Tier>,
    /// Match IDs requested per player history call.
    pub match_history_depth: u32,
    /// Concurrent detail-fetch workers.
    pub workers: usize,
    /// Completed matches between checkpoint saves.
    pub checkpoint_interval: u64,
    pub incomplete_match_policy: IncompleteMatchPolicy,
    /// Pagination cap per tier/division bucket.
    pub max_entry_pages: u32,
}

impl Default for CollectionSection {
    fn default() -> Self {
        Self {
            mode: CollectionMethod::Daily,
            tiers: Tier::ALL.to_vec(),
            match_history_depth: 200,
            workers: 4,
            checkpoint_interval: 500,
            incomplete_match_policy: IncompleteMatchPolicy::Mark,
            max_entry_pages: 10,
        }
    }
}

/// Quality gate settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualitySection {
    /// Minimum weighted score (0..1) required to advance past quality.
    pub quality_threshold: f64,
}

impl Default for QualitySection {
    fn default() -> Self {
        Self {
            quality_threshold: 0.8,
        }
    }
}

/// Backup stage settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupSection {
    /// Whether backup runs as part of the default target.
    pub auto_backup: bool,
    /// Age in days after which backups are eligible for cleanup.
    pub retention_days: u32,
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            auto_backup: true,
            retention_days: 30,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pipeline name, for logging only.
    pub pipeline: String,
    /// One cycle or a list; may instead be supplied on the command line.
    pub collection_date: Option<CycleSelection>,
    /// Directory all deterministic output paths hang off.
    pub data_root: PathBuf,
    pub api: ApiSection,
    pub collection: CollectionSection,
    pub quality: QualitySection,
    pub backup: BackupSection,
}
