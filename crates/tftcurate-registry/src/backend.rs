//! Registry trait definition.
//!
//! [`Registry`] defines the storage contract for match-status tracking and
//! player last-seen cycles. The engine pushes every discovered match ID
//! through [`Registry::claim`]; matches already `COMPLETE` are skipped
//! without a detail request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tftcurate_types::error::ErrorCategory;
use tftcurate_types::ids::{CycleId, MatchId, Puuid};

use crate::error;

/// Lifecycle status of a match in the registry.
///
/// Progress is monotone: once `Complete`, a row is frozen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// No row exists for the match yet.
    Unseen,
    /// Claimed by a collector; detail fetch outstanding.
    InProgress,
    Complete,
    /// Fetched but short of the expected participant count.
    Incomplete,
    Failed,
}

impl MatchStatus {
    /// Storage string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::Failed => "failed",
        }
    }

    /// Parse a storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unseen" => Some(Self::Unseen),
            "in_progress" => Some(Self::InProgress),
            "complete" => Some(Self::Complete),
            "incomplete" => Some(Self::Incomplete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full registry row for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub status: MatchStatus,
    pub first_seen_cycle: Option<CycleId>,
    pub completed_cycle: Option<CycleId>,
    pub last_error_category: Option<ErrorCategory>,
}

impl StatusRow {
    /// Row for a match the registry has never seen.
    #[must_use]
    pub fn unseen() -> Self {
        Self {
            status: MatchStatus::Unseen,
            first_seen_cycle: None,
            completed_cycle: None,
            last_error_category: None,
        }
    }
}

/// Result of an atomic claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller owns the detail fetch for this match.
    Claimed,
    /// Already collected in a prior cycle; no detail request needed.
    SkipComplete,
    /// Another worker claimed it within this cycle.
    SkipInFlight,
}

/// Storage contract for match-status tracking.
///
/// Implementations must be `Send + Sync` for use behind
/// `Arc<dyn Registry>`; `claim` must be atomic (at most one caller per
/// cycle receives [`ClaimOutcome::Claimed`] for a given match).
pub trait Registry: Send + Sync {
    /// Current status row for a match; `Unseen` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn status(&self, match_id: &MatchId) -> error::Result<StatusRow>;

    /// Atomically claim a match for detail fetching in `cycle`.
    ///
    /// Matches already `Complete` are skipped; `Incomplete`, `Failed`, and
    /// unseen matches are claimable; a match already `InProgress` within
    /// the same cycle yields [`ClaimOutcome::SkipInFlight`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn claim(&self, match_id: &MatchId, cycle: &CycleId) -> error::Result<ClaimOutcome>;

    /// Freeze a match as `Complete` for `cycle`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn complete(&self, match_id: &MatchId, cycle: &CycleId) -> error::Result<()>;

    /// Record a match as `Incomplete` (fetched short of the expected
    /// participant count); remains claimable in later cycles.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn mark_incomplete(&self, match_id: &MatchId, cycle: &CycleId) -> error::Result<()>;

    /// Record a failed fetch with its error category. Never demotes a
    /// `Complete` row.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn fail(&self, match_id: &MatchId, category: ErrorCategory) -> error::Result<()>;

    /// Record that a player was observed during `cycle`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn seen_player(&self, puuid: &Puuid, cycle: &CycleId) -> error::Result<()>;

    /// Row counts per status, for cycle summary logging.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`](crate::RegistryError) on storage failure.
    fn counts_by_status(&self) -> error::Result<BTreeMap<MatchStatus, u64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (can be used as `dyn Registry`).
    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn Registry) {}
    }

    #[test]
    fn status_storage_roundtrip() {
        for status in [
            MatchStatus::Unseen,
            MatchStatus::InProgress,
            MatchStatus::Complete,
            MatchStatus::Incomplete,
            MatchStatus::Failed,
        ] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MatchStatus::parse("??"), None);
    }

    #[test]
    fn unseen_row_is_empty() {
        let row = StatusRow::unseen();
        assert_eq!(row.status, MatchStatus::Unseen);
        assert!(row.first_seen_cycle.is_none());
        assert!(row.completed_cycle.is_none());
        assert!(row.last_error_category.is_none());
    }
}
