//! W3C-PROV assembler.
//!
//! Walks a completed cycle's stage outputs and emits a PROV-JSON
//! document: one entity per file artifact (with byte size, SHA-256, and
//! last-modified instant), one activity per stage plus the overall
//! workflow (times inferred from input/output mtimes), the involved
//! agents, and the relations tying them together. Error categories from
//! the artifact's `error_summary` become non-file entities influencing
//! the raw collection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tftcurate_types::artifact::CollectionArtifact;
use tftcurate_types::canonical::sha256_hex;

use crate::paths::CyclePaths;
use crate::stages::{read_json, write_json};

/// Software dependencies recorded as entities in every document.
const DEPENDENCIES: &[&str] = &[
    "tokio", "reqwest", "rusqlite", "serde", "serde_json", "serde_yaml", "arrow", "parquet",
    "flate2", "tracing", "clap",
];

/// PROV-JSON document (entities, activities, agents, relations).
#[derive(Debug, Default, Serialize)]
pub struct ProvDocument {
    #[serde(rename = "@context")]
    pub context: Value,
    pub entity: BTreeMap<String, Value>,
    pub activity: BTreeMap<String, Value>,
    pub agent: BTreeMap<String, Value>,
    #[serde(rename = "wasGeneratedBy")]
    pub was_generated_by: BTreeMap<String, Value>,
    pub used: BTreeMap<String, Value>,
    #[serde(rename = "wasDerivedFrom")]
    pub was_derived_from: BTreeMap<String, Value>,
    #[serde(rename = "wasAttributedTo")]
    pub was_attributed_to: BTreeMap<String, Value>,
    #[serde(rename = "wasAssociatedWith")]
    pub was_associated_with: BTreeMap<String, Value>,
    #[serde(rename = "wasInformedBy")]
    pub was_informed_by: BTreeMap<String, Value>,
    #[serde(rename = "wasInfluencedBy")]
    pub was_influenced_by: BTreeMap<String, Value>,
}

/// Run the provenance stage for one cycle.
///
/// # Errors
///
/// Fails when the raw artifact is unreadable or the document cannot be
/// written.
pub fn run(paths: &CyclePaths, config_path: Option<&Path>) -> Result<()> {
    let mut doc = build_document(paths, config_path)?;

    // The self-describing entity: checksum over the document as built so
    // far (it cannot cover bytes that include itself).
    let body = serde_json::to_vec(&doc).context("provenance serialization failed")?;
    doc.entity.insert(
        "entity:provenance".to_string(),
        json!({
            "prov:label": "workflow provenance document",
            "tft:path": paths.provenance().display().to_string(),
            "tft:byte_size": body.len(),
            "tft:sha256": sha256_hex(&body),
            "tft:last_modified": iso_now(),
        }),
    );

    write_json(&paths.provenance(), &doc)?;
    tracing::info!(
        cycle = %paths.cycle(),
        entities = doc.entity.len(),
        activities = doc.activity.len(),
        agents = doc.agent.len(),
        "Provenance document written"
    );
    Ok(())
}

/// Assemble the document for a cycle's on-disk outputs.
///
/// # Errors
///
/// Fails when the raw artifact is unreadable.
pub fn build_document(paths: &CyclePaths, config_path: Option<&Path>) -> Result<ProvDocument> {
    let artifact: CollectionArtifact = read_json(&paths.raw())?;

    let mut doc = ProvDocument {
        context: json!({
            "prov": "http://www.w3.org/ns/prov#",
            "tft": "https://schema.tftcurate.dev/tft#",
            "xsd": "http://www.w3.org/2001/XMLSchema#"
        }),
        ..ProvDocument::default()
    };
    let mut counters: BTreeMap<&'static str, u32> = BTreeMap::new();

    add_agents(&mut doc);

    // File entities, existing files only.
    let file_entities: Vec<(&str, &str, PathBuf)> = vec![
        ("entity:raw_collection", "raw collection artifact", paths.raw()),
        ("entity:validated", "validated artifact", paths.validated()),
        ("entity:transformed", "JSON-LD artifact", paths.transformed()),
        (
            "entity:validation_report",
            "validation report",
            paths.validation_report(),
        ),
        ("entity:quality_report", "quality report", paths.quality_report()),
        (
            "entity:cross_cycle_report",
            "cross-cycle report",
            paths.cross_cycle_report(),
        ),
        (
            "entity:parquet_matches",
            "matches parquet table",
            paths.parquet_matches(),
        ),
        (
            "entity:parquet_participants",
            "participants parquet table",
            paths.parquet_participants(),
        ),
        ("entity:backup", "backup archive", paths.backup()),
        ("entity:backup_metadata", "backup metadata", paths.backup_metadata()),
    ];
    for (id, label, path) in &file_entities {
        if let Some(entity) = file_entity(label, path)? {
            doc.entity.insert((*id).to_string(), entity);
            relate(
                &mut doc.was_attributed_to,
                &mut counters,
                "att",
                json!({"prov:entity": id, "prov:agent": "agent:orchestrator"}),
            );
        }
    }
    if let Some(config_path) = config_path {
        if let Some(entity) = file_entity("pipeline configuration", config_path)? {
            doc.entity.insert("entity:config".to_string(), entity);
        }
    }

    // The upstream source is credited for the raw data.
    if doc.entity.contains_key("entity:raw_collection") {
        relate(
            &mut doc.was_attributed_to,
            &mut counters,
            "att",
            json!({"prov:entity": "entity:raw_collection", "prov:agent": "agent:riot_games"}),
        );
    }

    // Dependency entities.
    for dependency in DEPENDENCIES {
        doc.entity.insert(
            format!("entity:dep_{dependency}"),
            json!({
                "prov:label": format!("software dependency: {dependency}"),
                "tft:role": "software-dependency"
            }),
        );
    }

    // Error-category entities influencing the raw collection.
    for (category, samples) in &artifact.error_summary.errors_by_category {
        let id = format!("entity:error_{}", category.as_str().to_ascii_lowercase());
        doc.entity.insert(
            id.clone(),
            json!({
                "prov:label": format!("collection errors: {category}"),
                "tft:count": samples.count,
                "tft:sampled_match_ids": samples.match_ids.len(),
                "tft:sampled_player_puuids": samples.player_puuids.len(),
            }),
        );
        relate(
            &mut doc.was_influenced_by,
            &mut counters,
            "inf",
            json!({"prov:influencee": "entity:raw_collection", "prov:influencer": id}),
        );
    }

    // Stage activities with mtime-inferred spans.
    let stages: Vec<(&str, Vec<PathBuf>, Vec<PathBuf>, Vec<(&str, &str)>)> = vec![
        (
            "collect",
            config_path.map(Path::to_path_buf).into_iter().collect(),
            vec![paths.raw()],
            vec![("entity:raw_collection", "entity:config")],
        ),
        (
            "validate",
            vec![paths.raw()],
            vec![paths.validated(), paths.validation_report()],
            vec![
                ("entity:validated", "entity:raw_collection"),
                ("entity:validation_report", "entity:raw_collection"),
            ],
        ),
        (
            "transform",
            vec![paths.validated()],
            vec![paths.transformed()],
            vec![("entity:transformed", "entity:validated")],
        ),
        (
            "quality",
            vec![paths.validated()],
            vec![paths.quality_report()],
            vec![("entity:quality_report", "entity:validated")],
        ),
        (
            "cross_cycle",
            vec![paths.validated()],
            vec![paths.cross_cycle_report()],
            vec![("entity:cross_cycle_report", "entity:validated")],
        ),
        (
            "parquet",
            vec![paths.transformed()],
            vec![paths.parquet_matches(), paths.parquet_participants()],
            vec![
                ("entity:parquet_matches", "entity:transformed"),
                ("entity:parquet_participants", "entity:transformed"),
            ],
        ),
        (
            "backup",
            vec![paths.raw(), paths.validated(), paths.transformed()],
            vec![paths.backup(), paths.backup_metadata()],
            vec![("entity:backup", "entity:raw_collection")],
        ),
    ];

    let entity_id_for = |path: &Path| -> Option<&str> {
        file_entities
            .iter()
            .find(|(_, _, p)| p == path)
            .map(|(id, _, _)| *id)
    };

    let mut previous_stage: Option<String> = None;
    for (name, inputs, outputs, derivations) in &stages {
        if !outputs.iter().any(|o| o.exists()) {
            continue;
        }
        let activity_id = format!("activity:{name}");
        doc.activity
            .insert(activity_id.clone(), activity_value(inputs, outputs));

        for output in outputs {
            if let Some(id) = entity_id_for(output) {
                if doc.entity.contains_key(id) {
                    relate(
                        &mut doc.was_generated_by,
                        &mut counters,
                        "gen",
                        json!({"prov:entity": id, "prov:activity": &activity_id}),
                    );
                }
            }
        }
        for input in inputs {
            let id = entity_id_for(input)
                .map(str::to_string)
                .or_else(|| {
                    (Some(input.as_path()) == config_path).then(|| "entity:config".to_string())
                });
            if let Some(id) = id {
                if doc.entity.contains_key(&id) {
                    relate(
                        &mut doc.used,
                        &mut counters,
                        "use",
                        json!({"prov:activity": &activity_id, "prov:entity": id}),
                    );
                }
            }
        }
        for (generated, source) in derivations {
            if doc.entity.contains_key(*generated) && doc.entity.contains_key(*source) {
                relate(
                    &mut doc.was_derived_from,
                    &mut counters,
                    "der",
                    json!({"prov:generatedEntity": generated, "prov:usedEntity": source}),
                );
            }
        }
        for agent in ["agent:orchestrator", "agent:user"] {
            relate(
                &mut doc.was_associated_with,
                &mut counters,
                "assoc",
                json!({"prov:activity": &activity_id, "prov:agent": agent}),
            );
        }
        if let Some(previous) = &previous_stage {
            relate(
                &mut doc.was_informed_by,
                &mut counters,
                "info",
                json!({"prov:informed": &activity_id, "prov:informant": previous}),
            );
        }
        previous_stage = Some(activity_id);
    }

    // Overall workflow activity spans earliest input to latest output.
    let all_files: Vec<PathBuf> = file_entities.iter().map(|(_, _, p)| p.clone()).collect();
    doc.activity.insert(
        "activity:workflow".to_string(),
        workflow_activity(&all_files),
    );
    relate(
        &mut doc.was_associated_with,
        &mut counters,
        "assoc",
        json!({"prov:activity": "activity:workflow", "prov:agent": "agent:workflow"}),
    );
    for dependency in DEPENDENCIES {
        relate(
            &mut doc.used,
            &mut counters,
            "use",
            json!({
                "prov:activity": "activity:workflow",
                "prov:entity": format!("entity:dep_{dependency}")
            }),
        );
    }

    Ok(doc)
}

fn add_agents(doc: &mut ProvDocument) {
    doc.agent.insert(
        "agent:orchestrator".to_string(),
        json!({
            "prov:type": "prov:SoftwareAgent",
            "prov:label": "tftcurate",
            "tft:version": env!("CARGO_PKG_VERSION"),
        }),
    );
    doc.agent.insert(
        "agent:workflow".to_string(),
        json!({
            "prov:type": "prov:SoftwareAgent",
            "prov:label": "tftcurate pipeline orchestrator",
        }),
    );
    doc.agent.insert(
        "agent:user".to_string(),
        json!({
            "prov:type": "prov:Person",
            "prov:label": std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".to_string()),
            "tft:host": std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        }),
    );
    doc.agent.insert(
        "agent:riot_games".to_string(),
        json!({
            "prov:type": "prov:Organization",
            "prov:label": "Riot Games",
            "tft:role": "upstream data source",
        }),
    );
}

/// Entity value for an existing file; `None` when the file is absent.
fn file_entity(label: &str, path: &Path) -> Result<Option<Value>> {
    let Ok(meta) = std::fs::metadata(path) else {
        return Ok(None);
    };
    let body =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let modified = meta
        .modified()
        .map(iso_from_system_time)
        .unwrap_or_else(|_| iso_now());
    Ok(Some(json!({
        "prov:label": label,
        "tft:path": std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()).display().to_string(),
        "tft:byte_size": meta.len(),
        "tft:sha256": sha256_hex(&body),
        "tft:last_modified": modified,
    })))
}

fn activity_value(inputs: &[PathBuf], outputs: &[PathBuf]) -> Value {
    let started = latest_mtime(inputs)
        .or_else(|| earliest_mtime(outputs))
        .unwrap_or_else(Utc::now);
    let ended = latest_mtime(outputs).unwrap_or_else(Utc::now);
    let duration = (ended - started).num_milliseconds().max(0) as f64 / 1_000.0;
    json!({
        "prov:startedAtTime": iso(started),
        "prov:endedAtTime": iso(ended),
        "tft:duration_seconds": duration,
    })
}

fn workflow_activity(files: &[PathBuf]) -> Value {
    let started = earliest_mtime(files).unwrap_or_else(Utc::now);
    let ended = latest_mtime(files).unwrap_or_else(Utc::now);
    let duration = (ended - started).num_milliseconds().max(0) as f64 / 1_000.0;
    json!({
        "prov:label": "collection workflow",
        "prov:startedAtTime": iso(started),
        "prov:endedAtTime": iso(ended),
        "tft:duration_seconds": duration,
    })
}

fn latest_mtime(files: &[PathBuf]) -> Option<DateTime<Utc>> {
    files
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok()?.modified().ok())
        .max()
        .map(DateTime::from)
}

fn earliest_mtime(files: &[PathBuf]) -> Option<DateTime<Utc>> {
    files
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok()?.modified().ok())
        .min()
        .map(DateTime::from)
}

fn relate(
    section: &mut BTreeMap<String, Value>,
    counters: &mut BTreeMap<&'static str, u32>,
    prefix: &'static str,
    value: Value,
) {
    let counter = counters.entry(prefix).or_insert(0);
    *counter += 1;
    section.insert(format!("_:{prefix}{counter}"), value);
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn iso_now() -> String {
    iso(Utc::now())
}

fn iso_from_system_time(t: std::time::SystemTime) -> String {
    iso(DateTime::<Utc>::from(t))
}
