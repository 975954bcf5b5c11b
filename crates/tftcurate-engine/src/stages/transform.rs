//! Transform stage: JSON-LD enrichment of the validated artifact.
//!
//! Annotates players and matches with `@type`/`@id` pairs and ensures
//! the namespace context is present, producing the `.jsonld` document.

use anyhow::{anyhow, Result};
use serde_json::Value;
use tftcurate_types::artifact::default_context;

use crate::paths::CyclePaths;
use crate::stages::{read_json, write_json};

/// Run the transform stage for one cycle.
///
/// # Errors
///
/// Fails when the validated artifact is unreadable or not an object.
pub fn run(paths: &CyclePaths) -> Result<()> {
    let mut doc: Value = read_json(&paths.validated())?;
    let root = doc
        .as_object_mut()
        .ok_or_else(|| anyhow!("validated artifact is not a JSON object"))?;

    root.entry("@context").or_insert_with(default_context);
    root.entry("@type")
        .or_insert_with(|| Value::String("TFTDataCollection".into()));

    if let Some(players) = root.get_mut("players").and_then(Value::as_object_mut) {
        for (puuid, player) in players {
            if let Some(obj) = player.as_object_mut() {
                obj.insert("@type".into(), Value::String("TFTPlayer".into()));
                obj.insert("@id".into(), Value::String(format!("player:{puuid}")));
            }
        }
    }

    if let Some(matches) = root.get_mut("matches").and_then(Value::as_object_mut) {
        for (match_id, m) in matches {
            if let Some(obj) = m.as_object_mut() {
                obj.insert("@type".into(), Value::String("TFTMatch".into()));
                obj.insert(
                    "@id".into(),
                    Value::String(format!("urn:tft:match:{match_id}")),
                );
            }
        }
    }

    write_json(&paths.transformed(), &doc)?;
    tracing::info!(cycle = %paths.cycle(), "Artifact transformed to JSON-LD");
    Ok(())
}
