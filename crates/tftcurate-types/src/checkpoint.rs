//! Checkpoint snapshot of collector progress.
//!
//! Serialized by the engine's checkpoint store so an interrupted cycle
//! resumes exactly where it left off: the discovery cursor, the players
//! already processed, the pending match queue, and everything collected
//! so far.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::account::ErrorAccount;
use crate::artifact::{IncompleteMatchNote, Leaderboards, MatchRecord, PlayerRecord};
use crate::ids::CycleId;
use crate::tier::TierDivision;

/// Resumable collector state for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub cycle_id: CycleId,
    /// Next ranked-matrix bucket discovery should visit; `None` before the
    /// first bucket completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_tier_division: Option<TierDivision>,
    /// True once every bucket has been enumerated.
    #[serde(default)]
    pub discovery_complete: bool,
    /// Players whose match histories have been fetched.
    #[serde(default)]
    pub processed_players: BTreeSet<String>,
    /// Claimed match IDs whose details are still outstanding.
    #[serde(default)]
    pub pending_matches: Vec<String>,
    #[serde(default)]
    pub players: BTreeMap<String, PlayerRecord>,
    #[serde(default)]
    pub matches: BTreeMap<String, MatchRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboards: Option<Leaderboards>,
    /// Completed detail fetches this cycle, for checkpoint cadence.
    #[serde(default)]
    pub matches_collected: u64,
    /// Detail fetches scheduled this cycle; the shortfall against total
    /// match references is the deduplication saving.
    #[serde(default)]
    pub detail_calls_scheduled: u64,
    /// Incomplete matches observed, kept regardless of policy.
    #[serde(default)]
    pub incomplete_notes: Vec<IncompleteMatchNote>,
    #[serde(default)]
    pub error_account: ErrorAccount,
}

impl CheckpointSnapshot {
    /// Empty snapshot at the start of a cycle.
    #[must_use]
    pub fn empty(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            cursor_tier_division: None,
            discovery_complete: false,
            processed_players: BTreeSet::new(),
            pending_matches: Vec::new(),
            players: BTreeMap::new(),
            matches: BTreeMap::new(),
            leaderboards: None,
            matches_collected: 0,
            detail_calls_scheduled: 0,
            incomplete_notes: Vec::new(),
            error_account: ErrorAccount::default(),
        }
    }
}
