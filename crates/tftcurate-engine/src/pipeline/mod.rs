//! Stage DAG orchestration.
//!
//! Per cycle: collect -> validate -> transform -> quality, then the
//! fan-out stages (cross_cycle, parquet, backup, provenance; unordered
//! by contract, with provenance last here so it can describe everything
//! the run produced). A stage is skipped when all of its outputs exist
//! and are newer than all of its inputs; it fails the DAG when it errors
//! or leaves a declared output missing. A list of cycles fans out into
//! independent pipelines sharing only the registry.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use chrono::Utc;
use tokio::sync::watch;

use tftcurate_client::{ClientConfig, RiotClient};
use tftcurate_registry::SqliteRegistry;
use tftcurate_types::ids::{CycleId, Region};

use crate::checkpoint::CheckpointStore;
use crate::collector::{CollectOutcome, CollectionEngine, CollectorSettings};
use crate::config::parser::load_api_key;
use crate::config::types::PipelineConfig;
use crate::errors::EngineError;
use crate::paths::CyclePaths;
use crate::{provenance, stages};

/// Outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Skipped,
}

/// Per-stage result line data.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: &'static str,
    pub status: StageStatus,
    pub duration_secs: f64,
}

impl StageReport {
    /// Render the orchestrator's result line for this stage.
    #[must_use]
    pub fn line(&self) -> String {
        match self.status {
            StageStatus::Completed => {
                format!("[ok]   {} ({:.2}s)", self.name, self.duration_secs)
            }
            StageStatus::Skipped => format!("[skip] {} (outputs up to date)", self.name),
        }
    }
}

/// Result of one cycle's pipeline run.
#[derive(Debug, Clone)]
pub struct CycleRunReport {
    pub cycle: CycleId,
    pub log_path: PathBuf,
    pub stages: Vec<StageReport>,
    pub collect_outcome: Option<CollectOutcome>,
}

impl CycleRunReport {
    /// All per-stage result lines for printing.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.stages.iter().map(StageReport::line).collect()
    }
}

/// Append-only stage log; the authoritative failure record for a cycle.
struct StageLog {
    file: std::fs::File,
}

impl StageLog {
    fn open(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::Infrastructure(anyhow!("log dir: {e}")))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| EngineError::Infrastructure(anyhow!("log open: {e}")))?;
        Ok(Self { file })
    }

    fn line(&mut self, message: &str) {
        let stamped = format!("{} - {message}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
        if let Err(e) = writeln!(self.file, "{stamped}") {
            tracing::warn!("Failed to append to stage log: {e}");
        }
    }
}

/// Run the pipeline for every configured cycle, in order.
///
/// # Errors
///
/// Returns the first cycle's failure; completed cycles keep their
/// outputs.
pub async fn run_pipeline(
    config: &PipelineConfig,
    config_path: Option<&Path>,
    cancel: &watch::Receiver<bool>,
) -> Result<Vec<CycleRunReport>, EngineError> {
    let cycles: Vec<CycleId> = config
        .collection_date
        .as_ref()
        .map(|sel| sel.cycles().to_vec())
        .unwrap_or_default();
    if cycles.is_empty() {
        return Err(EngineError::Infrastructure(anyhow!(
            "no collection_date configured (set it in the config or pass --date)"
        )));
    }

    let mut reports = Vec::with_capacity(cycles.len());
    for cycle in cycles {
        reports.push(run_cycle(config, config_path, &cycle, cancel).await?);
    }
    Ok(reports)
}

/// Run only the collection stage for one cycle (the `collect` command).
/// Returns `None` when an artifact already exists and no checkpoint is
/// outstanding.
///
/// # Errors
///
/// Propagates resumable collector errors and collection failures.
pub async fn run_collect(
    config: &PipelineConfig,
    cycle: &CycleId,
    cancel: &watch::Receiver<bool>,
) -> Result<Option<CollectOutcome>, EngineError> {
    let paths = CyclePaths::new(&config.data_root, cycle.clone());
    let mut log = StageLog::open(&paths.log())?;
    let (_report, outcome) = collect_stage(config, &paths, cancel, &mut log).await?;
    Ok(outcome)
}

/// Run the full stage DAG for one cycle.
///
/// # Errors
///
/// Propagates resumable collector errors and stage failures.
pub async fn run_cycle(
    config: &PipelineConfig,
    config_path: Option<&Path>,
    cycle: &CycleId,
    cancel: &watch::Receiver<bool>,
) -> Result<CycleRunReport, EngineError> {
    let paths = CyclePaths::new(&config.data_root, cycle.clone());
    let mut log = StageLog::open(&paths.log())?;
    log.line(&format!("=== pipeline run for cycle {cycle} ==="));

    let mut stages_run = Vec::new();

    let (collect_report, collect_outcome) =
        collect_stage(config, &paths, cancel, &mut log).await?;
    stages_run.push(collect_report);

    let threshold = config.quality.quality_threshold;
    let sync_stages: Vec<(&'static str, Vec<PathBuf>, Vec<PathBuf>, StageFn)> = vec![
        (
            "validate",
            vec![paths.raw()],
            vec![paths.validated(), paths.validation_report()],
            Box::new(|p| stages::validate::run(p)),
        ),
        (
            "transform",
            vec![paths.validated()],
            vec![paths.transformed()],
            Box::new(|p| stages::transform::run(p)),
        ),
        (
            "quality",
            vec![paths.validated()],
            vec![paths.quality_report()],
            Box::new(move |p| stages::quality::run(p, threshold)),
        ),
        (
            "cross_cycle",
            vec![paths.validated()],
            vec![paths.cross_cycle_report()],
            Box::new(|p| stages::cross_cycle::run(p)),
        ),
        (
            "parquet",
            vec![paths.transformed()],
            vec![paths.parquet_matches(), paths.parquet_participants()],
            Box::new(|p| stages::parquet::run(p)),
        ),
    ];

    for (name, inputs, outputs, runner) in sync_stages {
        stages_run.push(run_sync_stage(name, &inputs, &outputs, &paths, &mut log, runner)?);
    }

    if config.backup.auto_backup {
        let retention_days = config.backup.retention_days;
        stages_run.push(run_sync_stage(
            "backup",
            &[
                paths.raw(),
                paths.validated(),
                paths.transformed(),
                paths.validation_report(),
                paths.quality_report(),
                paths.cross_cycle_report(),
            ],
            &[paths.backup(), paths.backup_metadata()],
            &paths,
            &mut log,
            Box::new(move |p| stages::backup::run(p, retention_days)),
        )?);
    }

    let prov_config = config_path.map(Path::to_path_buf);
    stages_run.push(run_sync_stage(
        "provenance",
        &[
            paths.raw(),
            paths.validated(),
            paths.transformed(),
            paths.validation_report(),
            paths.quality_report(),
            paths.cross_cycle_report(),
            paths.parquet_matches(),
            paths.parquet_participants(),
        ],
        &[paths.provenance()],
        &paths,
        &mut log,
        Box::new(move |p| provenance::run(p, prov_config.as_deref())),
    )?);

    log.line("pipeline complete");
    Ok(CycleRunReport {
        cycle: cycle.clone(),
        log_path: paths.log(),
        stages: stages_run,
        collect_outcome,
    })
}

type StageFn = Box<dyn FnOnce(&CyclePaths) -> anyhow::Result<()> + Send>;

/// Skip check: all outputs exist and are at least as new as every
/// existing input.
fn stage_is_fresh(inputs: &[PathBuf], outputs: &[PathBuf]) -> bool {
    let mut oldest_output = None;
    for output in outputs {
        let Ok(meta) = std::fs::metadata(output) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        oldest_output = Some(match oldest_output {
            None => modified,
            Some(prior) => std::cmp::min(prior, modified),
        });
    }
    let Some(oldest_output) = oldest_output else {
        return false;
    };

    for input in inputs {
        if let Ok(meta) = std::fs::metadata(input) {
            if let Ok(modified) = meta.modified() {
                if modified > oldest_output {
                    return false;
                }
            }
        }
    }
    true
}

fn run_sync_stage(
    name: &'static str,
    inputs: &[PathBuf],
    outputs: &[PathBuf],
    paths: &CyclePaths,
    log: &mut StageLog,
    runner: StageFn,
) -> Result<StageReport, EngineError> {
    if stage_is_fresh(inputs, outputs) {
        tracing::info!(stage = name, "Stage outputs up to date, skipping");
        log.line(&format!("[skip] {name}"));
        return Ok(StageReport {
            name,
            status: StageStatus::Skipped,
            duration_secs: 0.0,
        });
    }

    let start = Instant::now();
    tracing::info!(stage = name, "Running stage");
    match runner(paths) {
        Ok(()) => {
            for output in outputs {
                if !output.exists() {
                    log.line(&format!(
                        "[fail] {name}: declared output missing: {}",
                        output.display()
                    ));
                    return Err(EngineError::Stage {
                        stage: name,
                        source: anyhow!("declared output missing: {}", output.display()),
                    });
                }
            }
            let duration_secs = start.elapsed().as_secs_f64();
            log.line(&format!("[ok] {name} ({duration_secs:.2}s)"));
            Ok(StageReport {
                name,
                status: StageStatus::Completed,
                duration_secs,
            })
        }
        Err(e) => {
            log.line(&format!("[fail] {name}: {e:#}"));
            Err(EngineError::Stage {
                stage: name,
                source: e,
            })
        }
    }
}

async fn collect_stage(
    config: &PipelineConfig,
    paths: &CyclePaths,
    cancel: &watch::Receiver<bool>,
    log: &mut StageLog,
) -> Result<(StageReport, Option<CollectOutcome>), EngineError> {
    // Collect has no file inputs; existing output means nothing to do,
    // unless a checkpoint says the previous run was interrupted.
    if paths.raw().exists() && !paths.checkpoint().exists() {
        tracing::info!(stage = "collect", "Artifact already present, skipping");
        log.line("[skip] collect");
        return Ok((
            StageReport {
                name: "collect",
                status: StageStatus::Skipped,
                duration_secs: 0.0,
            },
            None,
        ));
    }

    let start = Instant::now();
    let api_key = load_api_key(Path::new(".")).map_err(|e| {
        log.line(&format!("[fail] collect: {e:#}"));
        tracing::error!("{e:#}");
        EngineError::MissingCredential
    })?;

    let region = Region::new(&config.api.region);
    let mut client_config = ClientConfig::new(api_key, region.clone());
    client_config.rate_limit.requests_per_two_minutes = config.api.rate_limit;
    client_config.rate_limit.requests_per_second = config.api.requests_per_second;
    client_config.platform_base = config.api.platform_base.clone();
    client_config.regional_base = config.api.regional_base.clone();
    let client = Arc::new(
        RiotClient::new(client_config)
            .map_err(|e| EngineError::Infrastructure(anyhow!("client build: {e}")))?,
    );

    let registry = Arc::new(SqliteRegistry::open(&paths.registry_db())?);
    let settings = CollectorSettings {
        cycle: paths.cycle().clone(),
        region,
        method: config.collection.mode,
        tiers: config.collection.tiers.clone(),
        policy: config.collection.incomplete_match_policy,
        workers: config.collection.workers,
        checkpoint_interval: config.collection.checkpoint_interval,
        match_history_depth: config.collection.match_history_depth,
        max_entry_pages: config.collection.max_entry_pages,
        data_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let engine = CollectionEngine::new(
        client,
        registry,
        CheckpointStore::new(paths.checkpoint()),
        settings,
        paths.raw(),
        cancel.clone(),
    );

    match engine.run().await {
        Ok(outcome) => {
            let duration_secs = start.elapsed().as_secs_f64();
            log.line(&format!(
                "[ok] collect ({duration_secs:.2}s) players={} matches={} saved={} errors={}",
                outcome.players, outcome.matches, outcome.api_calls_saved, outcome.total_errors
            ));
            Ok((
                StageReport {
                    name: "collect",
                    status: StageStatus::Completed,
                    duration_secs,
                },
                Some(outcome),
            ))
        }
        Err(e) => {
            log.line(&format!("[fail] collect: {e}"));
            Err(e)
        }
    }
}
