//! Identifier and match-status registry for the tftcurate pipeline.
//!
//! Provides the [`Registry`] trait and the SQLite implementation used to
//! skip already-collected matches across cycles ("status-aware
//! deduplication") and to track per-player last-seen cycles.

#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod sqlite;

// Top-level re-exports for convenience.
pub use backend::{ClaimOutcome, MatchStatus, Registry, StatusRow};
pub use error::RegistryError;
pub use sqlite::SqliteRegistry;
