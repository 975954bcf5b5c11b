//! Identifier newtypes.
//!
//! Opaque string wrappers keep match IDs, player PUUIDs, cycle keys, and
//! region codes from being confused with one another at API boundaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Riot match identifier (`<REGION>_<NUM>`, e.g. `LA2_1109838492`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Create a new match identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Region prefix of the identifier, if it is well-formed.
    #[must_use]
    pub fn region_prefix(&self) -> Option<&str> {
        self.0.split_once('_').map(|(region, _)| region)
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for MatchId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

// ---------------------------------------------------------------------------
// Puuid
// ---------------------------------------------------------------------------

/// Opaque, stable player identifier supplied by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Puuid(String);

impl Puuid {
    /// Create a new player identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Puuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for Puuid {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

// ---------------------------------------------------------------------------
// CycleId
// ---------------------------------------------------------------------------

/// Error constructing a [`CycleId`] from a malformed date key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cycle id '{0}': expected YYYYMMDD")]
pub struct CycleIdError(pub String);

/// Date key identifying one pipeline run (`YYYYMMDD`, e.g. `20251101`).
///
/// Validated on construction so a cycle always maps to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CycleId(String);

impl CycleId {
    /// Parse and validate a `YYYYMMDD` date key.
    ///
    /// # Errors
    ///
    /// Returns [`CycleIdError`] if the key is not a valid calendar date.
    pub fn new(id: impl Into<String>) -> Result<Self, CycleIdError> {
        let id = id.into();
        NaiveDate::parse_from_str(&id, "%Y%m%d").map_err(|_| CycleIdError(id.clone()))?;
        Ok(Self(id))
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date this cycle covers.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        // Invariant: validated in `new`.
        NaiveDate::parse_from_str(&self.0, "%Y%m%d").unwrap_or_default()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CycleId {
    type Error = CycleIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CycleId> for String {
    fn from(value: CycleId) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Platform region code, canonicalized to uppercase (e.g. `LA2`).
///
/// Maps to the platform host for league/summoner endpoints and the
/// regional host for match endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Region(String);

impl Region {
    /// Create a region code, folding to the canonical uppercase form.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_uppercase())
    }

    /// Borrow the canonical code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform host serving league and summoner endpoints.
    #[must_use]
    pub fn platform_host(&self) -> String {
        format!("{}.api.riotgames.com", self.0.to_ascii_lowercase())
    }

    /// Regional host serving match endpoints.
    #[must_use]
    pub fn regional_host(&self) -> String {
        let routing = match self.0.as_str() {
            "BR1" | "LA1" | "LA2" | "NA1" => "americas",
            "JP1" | "KR" => "asia",
            "OC1" | "PH2" | "SG2" | "TH2" | "TW2" | "VN2" => "sea",
            // EUN1, EUW1, TR1, RU, ME1 and anything unrecognized.
            _ => "europe",
        };
        format!("{routing}.api.riotgames.com")
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Region {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
