//! Console logging for the pipeline commands.
//!
//! Collection runs emit per-stage and per-bucket progress from the
//! engine, client, and registry crates; targets are shown so a line can
//! be traced to its stage. `RUST_LOG` overrides everything.

use tracing_subscriber::EnvFilter;

/// Crates whose events `--log-level` governs.
const OWN_CRATES: &[&str] = &[
    "tftcurate_cli",
    "tftcurate_engine",
    "tftcurate_client",
    "tftcurate_registry",
];

/// Install the global subscriber.
///
/// Without `RUST_LOG`, `level` applies to the tftcurate crates while
/// everything else (the HTTP stack in particular) stays at `warn`, so
/// cycle progress isn't buried under per-request noise.
pub fn init(level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives: Vec<String> = std::iter::once("warn".to_string())
                .chain(OWN_CRATES.iter().map(|krate| format!("{krate}={level}")))
                .collect();
            EnvFilter::new(directives.join(","))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
