mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tftcurate_engine::EngineError;

#[derive(Parser)]
#[command(
    name = "tftcurate",
    version,
    about = "Curate ranked TFT match data into provenance-tracked datasets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one or more cycles
    Run {
        /// Path to pipeline YAML file
        #[arg(long, default_value = "config/pipeline.yaml")]
        config: PathBuf,
        /// Cycle date key(s) (YYYYMMDD); overrides collection_date
        #[arg(long = "date")]
        dates: Vec<String>,
    },
    /// Run only the collection stage
    Collect {
        /// Path to pipeline YAML file
        #[arg(long, default_value = "config/pipeline.yaml")]
        config: PathBuf,
        /// Cycle date key(s) (YYYYMMDD); overrides collection_date
        #[arg(long = "date")]
        dates: Vec<String>,
    },
    /// Validate configuration and credentials without collecting
    Check {
        /// Path to pipeline YAML file
        #[arg(long, default_value = "config/pipeline.yaml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let result = match cli.command {
        Commands::Run { config, dates } => commands::run::execute(&config, &dates).await,
        Commands::Collect { config, dates } => commands::collect::execute(&config, &dates).await,
        Commands::Check { config } => commands::check::execute(&config),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        let code = err
            .downcast_ref::<EngineError>()
            .map_or(tftcurate_engine::EXIT_FATAL, EngineError::exit_code);
        std::process::exit(code);
    }
}
