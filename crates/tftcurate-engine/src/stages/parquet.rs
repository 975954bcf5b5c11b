//! Parquet stage: columnar conversion of the transformed artifact.
//!
//! Two tables per cycle: match-level metadata and participant-level
//! performance rows. Complex nested fields (traits, units, augments)
//! are stored as JSON strings for compatibility.

use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tftcurate_types::artifact::CollectionArtifact;

use crate::paths::CyclePaths;
use crate::stages::read_json;

/// Run the parquet stage for one cycle.
///
/// # Errors
///
/// Fails when the transformed artifact is unreadable or a table cannot
/// be written.
pub fn run(paths: &CyclePaths) -> Result<()> {
    let artifact: CollectionArtifact = read_json(&paths.transformed())?;
    std::fs::create_dir_all(paths.parquet_dir())
        .with_context(|| format!("failed to create {}", paths.parquet_dir().display()))?;

    write_matches(paths, &artifact)?;
    write_participants(paths, &artifact)?;

    tracing::info!(
        cycle = %paths.cycle(),
        matches = artifact.matches.len(),
        "Parquet tables written"
    );
    Ok(())
}

fn write_matches(paths: &CyclePaths, artifact: &CollectionArtifact) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("match_id", DataType::Utf8, false),
        Field::new("data_version", DataType::Utf8, true),
        Field::new("tft_set_number", DataType::Int64, true),
        Field::new("game_datetime_ms", DataType::Int64, false),
        Field::new("game_length", DataType::Float64, false),
        Field::new("game_version", DataType::Utf8, true),
        Field::new("queue_id", DataType::Int64, true),
        Field::new("tft_game_type", DataType::Utf8, true),
        Field::new("is_incomplete", DataType::Boolean, false),
    ]));

    let mut match_id = StringBuilder::new();
    let mut data_version = StringBuilder::new();
    let mut set_number = Int64Builder::new();
    let mut game_datetime = Int64Builder::new();
    let mut game_length = Float64Builder::new();
    let mut game_version = StringBuilder::new();
    let mut queue_id = Int64Builder::new();
    let mut game_type = StringBuilder::new();
    let mut is_incomplete = BooleanBuilder::new();

    for m in artifact.matches.values() {
        match_id.append_value(&m.match_id);
        data_version.append_option(m.data_version.as_deref());
        set_number.append_option(m.info.tft_set_number);
        game_datetime.append_value(m.info.game_datetime);
        game_length.append_value(m.info.game_length);
        game_version.append_option(m.info.game_version.as_deref());
        queue_id.append_option(m.info.queue_id);
        game_type.append_option(m.info.tft_game_type.as_deref());
        is_incomplete.append_value(m.is_incomplete.unwrap_or(false));
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(match_id.finish()),
        Arc::new(data_version.finish()),
        Arc::new(set_number.finish()),
        Arc::new(game_datetime.finish()),
        Arc::new(game_length.finish()),
        Arc::new(game_version.finish()),
        Arc::new(queue_id.finish()),
        Arc::new(game_type.finish()),
        Arc::new(is_incomplete.finish()),
    ];
    write_table(&paths.parquet_matches(), schema, columns)
}

fn write_participants(paths: &CyclePaths, artifact: &CollectionArtifact) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("match_id", DataType::Utf8, false),
        Field::new("puuid", DataType::Utf8, false),
        Field::new("placement", DataType::Int64, false),
        Field::new("level", DataType::Int64, false),
        Field::new("gold_left", DataType::Int64, true),
        Field::new("last_round", DataType::Int64, true),
        Field::new("time_eliminated", DataType::Float64, true),
        Field::new("total_damage_to_players", DataType::Int64, true),
        Field::new("players_eliminated", DataType::Int64, true),
        Field::new("traits", DataType::Utf8, false),
        Field::new("units", DataType::Utf8, false),
        Field::new("augments", DataType::Utf8, false),
    ]));

    let mut match_id = StringBuilder::new();
    let mut puuid = StringBuilder::new();
    let mut placement = Int64Builder::new();
    let mut level = Int64Builder::new();
    let mut gold_left = Int64Builder::new();
    let mut last_round = Int64Builder::new();
    let mut time_eliminated = Float64Builder::new();
    let mut total_damage = Int64Builder::new();
    let mut players_eliminated = Int64Builder::new();
    let mut traits = StringBuilder::new();
    let mut units = StringBuilder::new();
    let mut augments = StringBuilder::new();

    for m in artifact.matches.values() {
        for p in &m.info.participants {
            match_id.append_value(&m.match_id);
            puuid.append_value(&p.puuid);
            placement.append_value(i64::from(p.placement));
            level.append_value(i64::from(p.level));
            gold_left.append_option(p.gold_left);
            last_round.append_option(p.last_round);
            time_eliminated.append_option(p.time_eliminated);
            total_damage.append_option(p.total_damage_to_players);
            players_eliminated.append_option(p.players_eliminated);
            traits.append_value(serde_json::to_string(&p.traits)?);
            units.append_value(serde_json::to_string(&p.units)?);
            augments.append_value(serde_json::to_string(&p.augments)?);
        }
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(match_id.finish()),
        Arc::new(puuid.finish()),
        Arc::new(placement.finish()),
        Arc::new(level.finish()),
        Arc::new(gold_left.finish()),
        Arc::new(last_round.finish()),
        Arc::new(time_eliminated.finish()),
        Arc::new(total_damage.finish()),
        Arc::new(players_eliminated.finish()),
        Arc::new(traits.finish()),
        Arc::new(units.finish()),
        Arc::new(augments.finish()),
    ];
    write_table(&paths.parquet_participants(), schema, columns)
}

fn write_table(
    path: &std::path::Path,
    schema: Arc<Schema>,
    columns: Vec<ArrayRef>,
) -> Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .context("failed to assemble record batch")?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).context("failed to open parquet writer")?;
    writer.write(&batch).context("failed to write parquet")?;
    writer.close().context("failed to finalize parquet")?;
    Ok(())
}
