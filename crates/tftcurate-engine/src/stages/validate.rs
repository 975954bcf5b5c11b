//! Validation stage: structural checks over the raw artifact.
//!
//! Writes the validation report and, when the artifact passes, the
//! validated copy downstream stages consume.

use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tftcurate_types::artifact::CollectionArtifact;
use tftcurate_types::riot::EXPECTED_PARTICIPANTS;

use crate::paths::CyclePaths;
use crate::stages::{read_json, write_json};

#[derive(Debug, Serialize)]
struct ValidationReport {
    #[serde(rename = "@type")]
    report_type: &'static str,
    cycle: String,
    timestamp: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    players_count: usize,
    matches_count: usize,
    incomplete_matches: usize,
}

/// Run the validation stage for one cycle.
///
/// # Errors
///
/// Fails when the raw artifact is unreadable or structurally invalid;
/// the report is written either way.
pub fn run(paths: &CyclePaths) -> Result<()> {
    let artifact: CollectionArtifact = read_json(&paths.raw())?;

    let errors = match artifact.validate() {
        Ok(()) => Vec::new(),
        Err(e) => e.violations,
    };

    let mut warnings = Vec::new();
    for (id, m) in &artifact.matches {
        if m.info.participants.len() < EXPECTED_PARTICIPANTS && m.is_incomplete.is_none() {
            warnings.push(format!(
                "match '{id}' has {} participants and no incomplete flag",
                m.info.participants.len()
            ));
        }
        if m.info.game_version.is_none() {
            warnings.push(format!("match '{id}' is missing game_version"));
        }
    }
    if artifact.players.is_empty() && !artifact.matches.is_empty() {
        warnings.push("matches present but players map is empty".to_string());
    }

    let report = ValidationReport {
        report_type: "ValidationReport",
        cycle: paths.cycle().as_str().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        valid: errors.is_empty(),
        errors: errors.clone(),
        warnings,
        players_count: artifact.players.len(),
        matches_count: artifact.matches.len(),
        incomplete_matches: artifact.collection_stats.incomplete_matches.len(),
    };
    write_json(&paths.validation_report(), &report)?;

    if !errors.is_empty() {
        bail!(
            "artifact failed validation with {} error(s); see {}",
            errors.len(),
            paths.validation_report().display()
        );
    }

    write_json(&paths.validated(), &artifact)?;
    tracing::info!(
        cycle = %paths.cycle(),
        players = report.players_count,
        matches = report.matches_count,
        warnings = report.warnings.len(),
        "Artifact validated"
    );
    Ok(())
}
