//! Quality stage: weighted scoring and the advancement gate.
//!
//! Component weights: completeness 0.25, consistency 0.20, accuracy
//! 0.20, integrity 0.15, structure 0.20. The cycle fails the DAG when
//! the weighted score falls below the configured threshold.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tftcurate_types::artifact::CollectionArtifact;
use tftcurate_types::riot::EXPECTED_PARTICIPANTS;

use crate::paths::CyclePaths;
use crate::stages::{read_json, write_json};

const WEIGHTS: [(&str, f64); 5] = [
    ("completeness", 0.25),
    ("consistency", 0.20),
    ("accuracy", 0.20),
    ("integrity", 0.15),
    ("structure", 0.20),
];

#[derive(Debug, Serialize)]
struct QualityReport {
    #[serde(rename = "@type")]
    report_type: &'static str,
    cycle: String,
    timestamp: String,
    score: f64,
    threshold: f64,
    passed: bool,
    components: BTreeMap<String, f64>,
    weights: BTreeMap<String, f64>,
}

/// Run the quality stage for one cycle.
///
/// # Errors
///
/// Fails when the validated artifact is unreadable or the score falls
/// below `threshold`; the report is written either way.
pub fn run(paths: &CyclePaths, threshold: f64) -> Result<()> {
    let artifact: CollectionArtifact = read_json(&paths.validated())?;

    let mut components = BTreeMap::new();
    components.insert("completeness".to_string(), completeness(&artifact));
    components.insert("consistency".to_string(), consistency(&artifact));
    components.insert("accuracy".to_string(), accuracy(&artifact));
    components.insert("integrity".to_string(), integrity(&artifact));
    components.insert("structure".to_string(), structure(paths)?);

    let score: f64 = WEIGHTS
        .iter()
        .map(|(name, weight)| weight * components.get(*name).copied().unwrap_or(0.0))
        .sum();

    let report = QualityReport {
        report_type: "QualityReport",
        cycle: paths.cycle().as_str().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        score,
        threshold,
        passed: score >= threshold,
        components,
        weights: WEIGHTS
            .iter()
            .map(|(name, weight)| ((*name).to_string(), *weight))
            .collect(),
    };
    write_json(&paths.quality_report(), &report)?;

    tracing::info!(
        cycle = %paths.cycle(),
        score,
        threshold,
        passed = report.passed,
        "Quality assessed"
    );
    if !report.passed {
        bail!(
            "quality score {score:.3} below threshold {threshold:.3}; see {}",
            paths.quality_report().display()
        );
    }
    Ok(())
}

/// Share of matches carrying the full participant count and a game
/// version.
fn completeness(artifact: &CollectionArtifact) -> f64 {
    ratio(artifact, |m| {
        m.info.participants.len() == EXPECTED_PARTICIPANTS && m.info.game_version.is_some()
    })
}

/// Share of matches whose placements are distinct and within range.
fn consistency(artifact: &CollectionArtifact) -> f64 {
    ratio(artifact, |m| {
        let mut seen = [false; 9];
        m.info.participants.iter().all(|p| {
            let placement = p.placement as usize;
            if placement == 0 || placement > 8 || seen[placement] {
                return false;
            }
            seen[placement] = true;
            !p.puuid.is_empty()
        })
    })
}

/// Share of matches with plausible timing data inside the window.
fn accuracy(artifact: &CollectionArtifact) -> f64 {
    let info = &artifact.collection_info;
    ratio(artifact, |m| {
        m.info.game_datetime >= info.window_start_ms
            && m.info.game_datetime < info.window_end_ms
            && m.info.game_length > 0.0
    })
}

/// Share of participant references resolvable in the players map.
fn integrity(artifact: &CollectionArtifact) -> f64 {
    let mut total = 0usize;
    let mut resolved = 0usize;
    for m in artifact.matches.values() {
        for p in &m.info.participants {
            total += 1;
            if artifact.players.contains_key(&p.puuid) {
                resolved += 1;
            }
        }
    }
    if total == 0 {
        1.0
    } else {
        resolved as f64 / total as f64
    }
}

/// Tree-shape check over the raw JSON document.
fn structure(paths: &CyclePaths) -> Result<f64> {
    let doc: Value = read_json(&paths.validated())?;
    let required = ["collectionInfo", "players", "matches", "error_summary"];
    let present = required
        .iter()
        .filter(|key| doc.get(**key).is_some())
        .count();
    Ok(present as f64 / required.len() as f64)
}

fn ratio(artifact: &CollectionArtifact, predicate: impl Fn(&tftcurate_types::artifact::MatchRecord) -> bool) -> f64 {
    if artifact.matches.is_empty() {
        return 1.0;
    }
    let passing = artifact.matches.values().filter(|m| predicate(m)).count();
    passing as f64 / artifact.matches.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < f64::EPSILON);
    }
}
