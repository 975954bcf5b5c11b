//! In-memory error accounting with bounded identifier samples.
//!
//! Tracks failures by [`ErrorCategory`] while a cycle runs; serialized into
//! the artifact's `error_summary` and into checkpoints so a resumed run
//! keeps its history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCategory;
use crate::ids::{MatchId, Puuid};

/// Maximum identifiers retained per category, per kind.
pub const SAMPLE_BOUND: usize = 100;

/// Bounded samples for one error category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySamples {
    pub count: u64,
    #[serde(default)]
    pub match_ids: Vec<String>,
    #[serde(default)]
    pub player_puuids: Vec<String>,
}

/// Running account of failures for a collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorAccount {
    by_category: BTreeMap<ErrorCategory, CategorySamples>,
}

impl ErrorAccount {
    /// Record a failed match fetch.
    pub fn record_match(&mut self, category: ErrorCategory, match_id: &MatchId) {
        let samples = self.by_category.entry(category).or_default();
        samples.count += 1;
        let id = match_id.as_str();
        if samples.match_ids.len() < SAMPLE_BOUND && !samples.match_ids.iter().any(|m| m == id) {
            samples.match_ids.push(id.to_string());
        }
    }

    /// Record a failed player operation.
    pub fn record_player(&mut self, category: ErrorCategory, puuid: &Puuid) {
        let samples = self.by_category.entry(category).or_default();
        samples.count += 1;
        let id = puuid.as_str();
        if samples.player_puuids.len() < SAMPLE_BOUND
            && !samples.player_puuids.iter().any(|p| p == id)
        {
            samples.player_puuids.push(id.to_string());
        }
    }

    /// Drop a match from every category's samples, decrementing counts.
    /// Used when the automatic retry sweep recovers a match.
    pub fn forget_match(&mut self, match_id: &MatchId) {
        let id = match_id.as_str();
        for samples in self.by_category.values_mut() {
            let before = samples.match_ids.len();
            samples.match_ids.retain(|m| m != id);
            let removed = before - samples.match_ids.len();
            samples.count = samples.count.saturating_sub(removed as u64);
        }
        self.by_category.retain(|_, samples| samples.count > 0);
    }

    /// Total failures across all categories.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.by_category.values().map(|s| s.count).sum()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// Match identifiers recorded under retryable categories, deduplicated.
    #[must_use]
    pub fn retryable_match_ids(&self) -> Vec<MatchId> {
        let mut ids: Vec<MatchId> = self
            .by_category
            .iter()
            .filter(|(cat, _)| cat.is_retryable())
            .flat_map(|(_, samples)| samples.match_ids.iter().map(MatchId::new))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Snapshot for the artifact's `error_summary` block.
    #[must_use]
    pub fn summary(&self) -> ErrorSummary {
        ErrorSummary {
            total_errors: self.total_errors(),
            errors_by_category: self.by_category.clone(),
        }
    }
}

/// Serialized form embedded in every [`CollectionArtifact`].
///
/// [`CollectionArtifact`]: crate::artifact::CollectionArtifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total_errors: u64,
    #[serde(default)]
    pub errors_by_category: BTreeMap<ErrorCategory, CategorySamples>,
}
