use std::path::Path;

use anyhow::{anyhow, Result};

use tftcurate_engine::pipeline;

/// Execute the `collect` command: the collection stage alone, for every
/// selected cycle.
pub async fn execute(config_path: &Path, dates: &[String]) -> Result<()> {
    let config = super::load_config(config_path, dates)?;
    let cancel = super::cancellation();

    let cycles = config
        .collection_date
        .clone()
        .ok_or_else(|| anyhow!("no collection_date configured (set it or pass --date)"))?;

    for cycle in cycles.cycles() {
        let Some(outcome) = pipeline::run_collect(&config, cycle, &cancel).await? else {
            println!("Cycle {cycle}: artifact already present, nothing to collect");
            continue;
        };
        println!("Cycle {cycle} collected:");
        println!("  Artifact:        {}", outcome.artifact_path.display());
        println!("  Players:         {}", outcome.players);
        println!("  Matches:         {}", outcome.matches);
        println!("  API calls saved: {}", outcome.api_calls_saved);
        println!("  Errors:          {}", outcome.total_errors);
        for (status, count) in &outcome.registry_counts {
            println!("  Registry {status}: {count}");
        }
    }

    Ok(())
}
