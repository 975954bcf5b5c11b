//! Registry error types.

/// Errors produced by [`Registry`](crate::Registry) operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Underlying `SQLite` failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// File-system I/O failure (e.g. creating the database directory).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal mutex was poisoned by a panicked thread.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_poisoned_displays() {
        assert_eq!(
            RegistryError::LockPoisoned.to_string(),
            "registry lock poisoned"
        );
    }

    #[test]
    fn io_error_wraps() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = RegistryError::Io(inner);
        assert!(err.to_string().contains("i/o"));
    }
}
