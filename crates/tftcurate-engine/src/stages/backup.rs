//! Backup stage: compressed archive, metadata sidecar, and retention
//! cleanup.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tftcurate_types::canonical::sha256_hex;

use crate::paths::CyclePaths;
use crate::stages::write_json;

#[derive(Debug, Serialize)]
struct BackupMetadata {
    backup_name: String,
    created_at: String,
    compression: &'static str,
    files: Vec<BackupFile>,
    total_source_bytes: u64,
    archive_bytes: u64,
    compression_ratio: f64,
    sha256: String,
}

#[derive(Debug, Serialize)]
struct BackupFile {
    path: String,
    bytes: u64,
}

/// Run the backup stage for one cycle: archive every existing cycle
/// output, write the metadata sidecar, and prune expired backups.
///
/// # Errors
///
/// Fails when the archive or its metadata cannot be written.
pub fn run(paths: &CyclePaths, retention_days: u32) -> Result<()> {
    let candidates = [
        paths.raw(),
        paths.validated(),
        paths.transformed(),
        paths.validation_report(),
        paths.quality_report(),
        paths.cross_cycle_report(),
        paths.parquet_matches(),
        paths.parquet_participants(),
    ];
    let sources: Vec<PathBuf> = candidates.into_iter().filter(|p| p.exists()).collect();

    std::fs::create_dir_all(paths.backups_dir())
        .with_context(|| format!("failed to create {}", paths.backups_dir().display()))?;

    let archive_path = paths.backup();
    let archive = File::create(&archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let encoder = GzEncoder::new(archive, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut files = Vec::with_capacity(sources.len());
    let mut total_source_bytes = 0u64;
    for source in &sources {
        let arcname = source
            .strip_prefix(paths.root())
            .unwrap_or(source.as_path())
            .to_path_buf();
        builder
            .append_path_with_name(source, &arcname)
            .with_context(|| format!("failed to archive {}", source.display()))?;
        let bytes = std::fs::metadata(source).map(|m| m.len()).unwrap_or(0);
        total_source_bytes += bytes;
        files.push(BackupFile {
            path: arcname.display().to_string(),
            bytes,
        });
    }
    let encoder = builder
        .into_inner()
        .context("failed to finalize archive")?;
    encoder.finish().context("failed to finish compression")?;

    let archive_body = std::fs::read(&archive_path)
        .with_context(|| format!("failed to read back {}", archive_path.display()))?;
    let archive_bytes = archive_body.len() as u64;
    let metadata = BackupMetadata {
        backup_name: format!("backup_{}", paths.cycle()),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        compression: "gz",
        files,
        total_source_bytes,
        archive_bytes,
        compression_ratio: if archive_bytes == 0 {
            0.0
        } else {
            total_source_bytes as f64 / archive_bytes as f64
        },
        sha256: sha256_hex(&archive_body),
    };
    write_json(&paths.backup_metadata(), &metadata)?;

    tracing::info!(
        cycle = %paths.cycle(),
        files = metadata.files.len(),
        archive_bytes,
        "Backup written"
    );

    prune_expired(&paths.backups_dir(), retention_days, paths.cycle().as_str());
    Ok(())
}

/// Delete backups older than the retention window, never the current
/// cycle's.
fn prune_expired(dir: &Path, retention_days: u32, current_cycle: &str) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let cutoff = SystemTime::now() - Duration::from_secs(u64::from(retention_days) * 86_400);

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with("backup_") || name.contains(current_cycle) {
            continue;
        }
        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .map(|modified| modified < cutoff)
            .unwrap_or(false);
        if expired {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), "Failed to prune expired backup: {e}");
            } else {
                tracing::info!(path = %path.display(), "Pruned expired backup");
            }
        }
    }
}
