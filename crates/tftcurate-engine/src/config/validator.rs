//! Semantic validation for parsed pipeline configuration values.

use anyhow::{bail, Result};
use tftcurate_types::artifact::CollectionMethod;
use tftcurate_types::ids::Region;

use crate::config::types::PipelineConfig;

/// Validate a parsed pipeline configuration.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.api.region.trim().is_empty() {
        errors.push("api.region must not be empty".to_string());
    } else {
        let canonical = Region::new(&config.api.region);
        if !canonical
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
        {
            errors.push(format!(
                "api.region '{}' contains invalid characters",
                config.api.region
            ));
        }
    }

    if config.api.rate_limit == 0 {
        errors.push("api.rate_limit must be at least 1".to_string());
    }
    if config.api.requests_per_second == 0 {
        errors.push("api.requests_per_second must be at least 1".to_string());
    }

    if config.collection.mode == CollectionMethod::Incremental {
        errors.push(
            "collection.mode 'incremental' is not a recognized mode (daily or weekly)"
                .to_string(),
        );
    }
    if config.collection.tiers.is_empty() {
        errors.push("collection.tiers must name at least one tier".to_string());
    }
    if config.collection.workers == 0 {
        errors.push("collection.workers must be at least 1".to_string());
    }
    if config.collection.checkpoint_interval == 0 {
        errors.push("collection.checkpoint_interval must be at least 1".to_string());
    }
    if config.collection.match_history_depth == 0 {
        errors.push("collection.match_history_depth must be at least 1".to_string());
    }
    if config.collection.max_entry_pages == 0 {
        errors.push("collection.max_entry_pages must be at least 1".to_string());
    }

    if !(0.0..=1.0).contains(&config.quality.quality_threshold) {
        errors.push(format!(
            "quality.quality_threshold must be within 0..=1, got {}",
            config.quality.quality_threshold
        ));
    }

    if !errors.is_empty() {
        bail!("Invalid pipeline configuration:\n  - {}", errors.join("\n  - "));
    }

    Ok(())
}
