//! The collection artifact: the canonical JSON output of a cycle.
//!
//! A two-map structure (`players`, `matches`) joined by ID, plus
//! collection metadata, optional leaderboard snapshots, error accounting,
//! and collection statistics. Immutable once emitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::account::ErrorSummary;
use crate::ids::CycleId;
use crate::riot::{LeagueList, MatchInfo};
use crate::tier::{Division, Tier};

/// Artifact `@type` marker.
pub const ARTIFACT_TYPE: &str = "TFTDataCollection";

/// Apex league snapshots keyed `challenger` / `grandmaster` / `master`.
pub type Leaderboards = BTreeMap<String, LeagueList>;

/// Window policy that produced a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMethod {
    #[default]
    Daily,
    Weekly,
    /// Accepted for forward compatibility; not constructible from config.
    Incremental,
}

impl CollectionMethod {
    /// Storage string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for CollectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CollectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(format!(
                "unknown collection mode '{other}' (expected daily or weekly)"
            )),
        }
    }
}

/// What to do with matches reporting fewer participants than expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteMatchPolicy {
    /// Report only: retained unflagged, listed in collection stats.
    Identify,
    /// Dropped from the artifact.
    Filter,
    /// Retained with an `is_incomplete` flag.
    #[default]
    Mark,
}

impl IncompleteMatchPolicy {
    /// Storage string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Filter => "filter",
            Self::Mark => "mark",
        }
    }
}

impl std::fmt::Display for IncompleteMatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IncompleteMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identify" => Ok(Self::Identify),
            "filter" => Ok(Self::Filter),
            "mark" => Ok(Self::Mark),
            other => Err(format!("unknown incomplete-match policy '{other}'")),
        }
    }
}

/// Cycle metadata recorded in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    /// ISO-8601 UTC instant the cycle started.
    pub timestamp: String,
    /// Canonical uppercase region code.
    pub extraction_location: String,
    pub data_version: String,
    pub collection_method: CollectionMethod,
    pub incomplete_match_policy: IncompleteMatchPolicy,
    pub cycle: CycleId,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    /// Canonical content hash of the artifact body, filled at emit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_hash: Option<String>,
}

/// One curated player entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub puuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Division>,
    #[serde(default)]
    pub league_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summoner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_ids: Vec<String>,
}

/// One curated match entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_incomplete: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incomplete_reasons: Vec<String>,
    pub info: MatchInfo,
}

/// Note about one incomplete match, kept in collection stats regardless of
/// the configured policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncompleteMatchNote {
    pub match_id: String,
    pub participant_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<i64>,
}

/// Aggregate statistics for a collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub players_processed: u64,
    pub total_match_ids_collected: u64,
    pub unique_matches_fetched: u64,
    pub api_calls_saved: u64,
    pub players_with_no_matches: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incomplete_matches: Vec<IncompleteMatchNote>,
    pub collection_time_seconds: f64,
}

/// Invariant violations found while validating an artifact before emit.
#[derive(Debug, Clone, thiserror::Error)]
#[error("artifact invariant violations: {}", .violations.join("; "))]
pub struct InvariantError {
    pub violations: Vec<String>,
}

/// The canonical JSON output of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionArtifact {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(rename = "@type")]
    pub artifact_type: String,
    #[serde(rename = "collectionInfo")]
    pub collection_info: CollectionInfo,
    pub players: BTreeMap<String, PlayerRecord>,
    pub matches: BTreeMap<String, MatchRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboards: Option<Leaderboards>,
    pub error_summary: ErrorSummary,
    #[serde(default)]
    pub collection_stats: CollectionStats,
}

impl CollectionArtifact {
    /// Fresh artifact shell for a cycle.
    #[must_use]
    pub fn new(collection_info: CollectionInfo) -> Self {
        Self {
            context: default_context(),
            artifact_type: ARTIFACT_TYPE.to_string(),
            collection_info,
            players: BTreeMap::new(),
            matches: BTreeMap::new(),
            leaderboards: None,
            error_summary: ErrorSummary::default(),
            collection_stats: CollectionStats::default(),
        }
    }

    /// Check the structural invariants an emitted artifact must satisfy:
    /// every participant puuid appears in `players`, placements within a
    /// match never repeat and stay in 1..=8, every `game_datetime` lies in
    /// the cycle window, and map keys agree with embedded IDs.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] listing every violation found.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut violations = Vec::new();

        for (key, m) in &self.matches {
            if key != &m.match_id {
                violations.push(format!(
                    "match key '{key}' disagrees with matchId '{}'",
                    m.match_id
                ));
            }

            if !(self.collection_info.window_start_ms <= m.info.game_datetime
                && m.info.game_datetime < self.collection_info.window_end_ms)
            {
                violations.push(format!(
                    "match '{key}' game_datetime {} outside window [{}, {})",
                    m.info.game_datetime,
                    self.collection_info.window_start_ms,
                    self.collection_info.window_end_ms
                ));
            }

            let mut seen_placements = [false; 9];
            for p in &m.info.participants {
                if !self.players.contains_key(&p.puuid) {
                    violations.push(format!(
                        "match '{key}' participant '{}' missing from players",
                        p.puuid
                    ));
                }
                let placement = p.placement as usize;
                if placement == 0 || placement > 8 {
                    violations.push(format!(
                        "match '{key}' placement {} outside 1..=8",
                        p.placement
                    ));
                } else if seen_placements[placement] {
                    violations.push(format!(
                        "match '{key}' duplicate placement {}",
                        p.placement
                    ));
                } else {
                    seen_placements[placement] = true;
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(InvariantError { violations })
        }
    }
}

/// Default JSON-LD namespace bindings for the artifact `@context`.
#[must_use]
pub fn default_context() -> Value {
    json!({
        "@vocab": "https://schema.tftcurate.dev/vocab#",
        "schema": "https://schema.org/",
        "prov": "http://www.w3.org/ns/prov#",
        "tft": "https://schema.tftcurate.dev/tft#",
        "matches": {"@container": "@index"},
        "players": {"@container": "@index"}
    })
}
