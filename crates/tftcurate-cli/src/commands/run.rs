use std::path::Path;

use anyhow::Result;

use tftcurate_engine::pipeline;

/// Execute the `run` command: parse, validate, and run the stage DAG for
/// every selected cycle.
pub async fn execute(config_path: &Path, dates: &[String]) -> Result<()> {
    let config = super::load_config(config_path, dates)?;
    let cancel = super::cancellation();
    let config_file = config_path.exists().then(|| config_path.to_path_buf());

    let reports = pipeline::run_pipeline(&config, config_file.as_deref(), &cancel).await?;

    for report in &reports {
        println!("Cycle {}:", report.cycle);
        for line in report.lines() {
            println!("  {line}");
        }
        if let Some(outcome) = &report.collect_outcome {
            println!("  Players:         {}", outcome.players);
            println!("  Matches:         {}", outcome.matches);
            println!("  API calls saved: {}", outcome.api_calls_saved);
            println!("  Errors:          {}", outcome.total_errors);
        }
        println!("  Log:             {}", report.log_path.display());
    }

    Ok(())
}
