//! Cross-cycle stage: overlap and drift against the previous cycle.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tftcurate_types::artifact::CollectionArtifact;
use tftcurate_types::ids::CycleId;

use crate::paths::CyclePaths;
use crate::stages::{read_json, write_json};

#[derive(Debug, Serialize)]
struct CrossCycleReport {
    #[serde(rename = "@type")]
    report_type: &'static str,
    cycle: String,
    timestamp: String,
    baseline_cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison>,
}

#[derive(Debug, Serialize)]
struct Comparison {
    matches_current: usize,
    matches_baseline: usize,
    shared_matches: usize,
    players_current: usize,
    players_baseline: usize,
    shared_players: usize,
    player_overlap_ratio: f64,
    match_count_drift_pct: f64,
}

/// Run the cross-cycle stage for one cycle.
///
/// # Errors
///
/// Fails when the validated artifact is unreadable; a missing baseline
/// is reported, not an error.
pub fn run(paths: &CyclePaths) -> Result<()> {
    let current: CollectionArtifact = read_json(&paths.validated())?;

    let baseline = previous_cycle(paths)?;
    let report = match baseline {
        None => CrossCycleReport {
            report_type: "CrossCycleReport",
            cycle: paths.cycle().as_str().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            baseline_cycle: None,
            note: Some("no prior validated cycle to compare against".to_string()),
            comparison: None,
        },
        Some((baseline_cycle, baseline_artifact)) => {
            let shared_matches = current
                .matches
                .keys()
                .filter(|id| baseline_artifact.matches.contains_key(*id))
                .count();
            let shared_players = current
                .players
                .keys()
                .filter(|id| baseline_artifact.players.contains_key(*id))
                .count();
            let players_current = current.players.len();
            let player_overlap_ratio = if players_current == 0 {
                0.0
            } else {
                shared_players as f64 / players_current as f64
            };
            let matches_baseline = baseline_artifact.matches.len();
            let match_count_drift_pct = if matches_baseline == 0 {
                0.0
            } else {
                (current.matches.len() as f64 - matches_baseline as f64)
                    / matches_baseline as f64
                    * 100.0
            };

            CrossCycleReport {
                report_type: "CrossCycleReport",
                cycle: paths.cycle().as_str().to_string(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                baseline_cycle: Some(baseline_cycle.as_str().to_string()),
                note: None,
                comparison: Some(Comparison {
                    matches_current: current.matches.len(),
                    matches_baseline,
                    shared_matches,
                    players_current,
                    players_baseline: baseline_artifact.players.len(),
                    shared_players,
                    player_overlap_ratio,
                    match_count_drift_pct,
                }),
            }
        }
    };

    write_json(&paths.cross_cycle_report(), &report)?;
    tracing::info!(
        cycle = %paths.cycle(),
        baseline = report.baseline_cycle.as_deref().unwrap_or("none"),
        "Cross-cycle comparison written"
    );
    Ok(())
}

/// Most recent validated artifact from an earlier cycle, if any.
fn previous_cycle(paths: &CyclePaths) -> Result<Option<(CycleId, CollectionArtifact)>> {
    let dir = paths.validated_dir();
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Ok(None);
    };

    let mut best: Option<CycleId> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(candidate) = name
            .strip_prefix("tft_collection_")
            .and_then(|rest| rest.strip_suffix(".json"))
            .and_then(|key| CycleId::new(key).ok())
        else {
            continue;
        };
        if candidate < *paths.cycle() && best.as_ref().map_or(true, |b| candidate > *b) {
            best = Some(candidate);
        }
    }

    match best {
        None => Ok(None),
        Some(cycle) => {
            let path = CyclePaths::new(paths.root(), cycle.clone()).validated();
            let artifact = read_json(&path)?;
            Ok(Some((cycle, artifact)))
        }
    }
}
