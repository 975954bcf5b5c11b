//! Shared data model for the tftcurate collection pipeline.
//!
//! Pure data types used across the registry, client, and engine crates:
//! identifiers, the ranked ladder, Riot wire records, the collection
//! artifact, error accounting, checkpoint snapshots, canonical hashing,
//! and cycle time windows. Kept dependency-light so every other crate can
//! share them without cycles.

#![warn(clippy::pedantic)]

pub mod account;
pub mod artifact;
pub mod canonical;
pub mod checkpoint;
pub mod error;
pub mod ids;
pub mod riot;
pub mod tier;
pub mod window;

/// Common imports for typical usage.
///
/// ```
/// use tftcurate_types::prelude::*;
/// ```
pub mod prelude {
    pub use crate::account::ErrorAccount;
    pub use crate::artifact::{
        CollectionArtifact, CollectionInfo, CollectionMethod, IncompleteMatchPolicy,
    };
    pub use crate::checkpoint::CheckpointSnapshot;
    pub use crate::error::ErrorCategory;
    pub use crate::ids::{CycleId, MatchId, Puuid, Region};
    pub use crate::tier::{Division, Tier, TierDivision};
    pub use crate::window::CycleWindow;
}
