use std::path::Path;

use anyhow::Result;

use tftcurate_engine::config::parser::{load_api_key, API_KEY_VAR};
use tftcurate_types::ids::Region;

/// Execute the `check` command: validate configuration and credentials
/// without touching the API.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path, &[])?;

    let region = Region::new(&config.api.region);
    println!("Configuration OK");
    println!("  Pipeline:      {}", config.pipeline);
    println!("  Region:        {region}");
    println!("  Platform host: {}", region.platform_host());
    println!("  Regional host: {}", region.regional_host());
    println!("  Mode:          {}", config.collection.mode);
    println!(
        "  Rate budget:   {}/s, {}/2min",
        config.api.requests_per_second, config.api.rate_limit
    );
    println!(
        "  Tiers:         {}",
        config
            .collection
            .tiers
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    match &config.collection_date {
        Some(selection) => println!(
            "  Cycles:        {}",
            selection
                .cycles()
                .iter()
                .map(tftcurate_types::ids::CycleId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        None => println!("  Cycles:        (none; pass --date at run time)"),
    }

    match load_api_key(Path::new(".")) {
        Ok(_) => println!("  Credential:    {API_KEY_VAR} present"),
        Err(e) => println!("  Credential:    MISSING ({e})"),
    }

    Ok(())
}
