//! Engine error model and process exit codes.

use tftcurate_registry::RegistryError;
use tftcurate_types::artifact::InvariantError;

/// Exit code for a cycle that checkpointed and can resume.
pub const EXIT_RESUMABLE: i32 = 2;
/// Exit code for everything else that failed.
pub const EXIT_FATAL: i32 = 1;

/// Categorized engine error.
///
/// `AuthExpired` and `Interrupted` mean a checkpoint was written and the
/// same invocation can be repeated to resume; everything else is fatal
/// for the cycle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `RIOT_API_KEY` absent from both the environment and `.env`.
    #[error("RIOT_API_KEY is not set; export it or add it to a .env file")]
    MissingCredential,

    /// Upstream rejected the credential mid-cycle; checkpoint written.
    #[error("API credential rejected; checkpoint written, rerun with a fresh key to resume")]
    AuthExpired,

    /// Termination signal observed; checkpoint written.
    #[error("collection interrupted; checkpoint written, rerun to resume")]
    Interrupted,

    /// The artifact violated its structural invariants at emit. Nothing
    /// was published; the checkpoint is preserved.
    #[error(transparent)]
    Invariant(#[from] InvariantError),

    /// Registry storage failure.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Checkpoint store I/O failure.
    #[error("checkpoint i/o error: {0}")]
    Checkpoint(#[source] std::io::Error),

    /// A pipeline stage exited unsuccessfully.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Anything infrastructural (task panics, artifact I/O, config).
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl EngineError {
    /// Whether a checkpoint exists and the invocation can be repeated.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::AuthExpired | Self::Interrupted)
    }

    /// Process exit code the CLI should terminate with.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_resumable() {
            EXIT_RESUMABLE
        } else {
            EXIT_FATAL
        }
    }
}
