pub mod check;
pub mod collect;
pub mod run;

use anyhow::{Context, Result};
use tftcurate_engine::config::types::{CycleSelection, PipelineConfig};
use tftcurate_engine::config::{parse_config, validate_config};
use tftcurate_types::ids::CycleId;

/// Load, override, and validate a pipeline configuration.
pub(crate) fn load_config(
    path: &std::path::Path,
    dates: &[String],
) -> Result<PipelineConfig> {
    let mut config = if path.exists() {
        parse_config(path)?
    } else {
        tracing::warn!(
            config = %path.display(),
            "Config file not found, using defaults"
        );
        PipelineConfig::default()
    };

    if !dates.is_empty() {
        let cycles = dates
            .iter()
            .map(|d| CycleId::new(d.clone()))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid --date value")?;
        config.collection_date = Some(CycleSelection(cycles));
    }

    validate_config(&config)?;
    Ok(config)
}

/// Cancellation token flipped by Ctrl-C.
pub(crate) fn cancellation() -> tokio::sync::watch::Receiver<bool> {
    let (tx, rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work and checkpointing");
            let _ = tx.send(true);
            // A second interrupt exits immediately.
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
    rx
}
