//! Ranked ladder stratification.
//!
//! Tiers and divisions as the league endpoints report them. The apex tiers
//! (MASTER and above) are flat leagues without divisions.

use serde::{Deserialize, Serialize};

/// Ranked tier, ascending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    /// All tiers, ascending.
    pub const ALL: [Self; 9] = [
        Self::Iron,
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
        Self::Master,
        Self::Grandmaster,
        Self::Challenger,
    ];

    /// Wire-format string as the API reports it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iron => "IRON",
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
            Self::Diamond => "DIAMOND",
            Self::Master => "MASTER",
            Self::Grandmaster => "GRANDMASTER",
            Self::Challenger => "CHALLENGER",
        }
    }

    /// Apex tiers are flat leagues with no divisions.
    #[must_use]
    pub fn is_apex(self) -> bool {
        matches!(self, Self::Master | Self::Grandmaster | Self::Challenger)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == folded)
            .ok_or_else(|| format!("unknown tier '{s}'"))
    }
}

/// Ranked division within a non-apex tier, strongest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

impl Division {
    /// All divisions, strongest first.
    pub const ALL: [Self; 4] = [Self::I, Self::II, Self::III, Self::IV];

    /// Wire-format string as the API reports it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
        }
    }
}

impl std::fmt::Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket of the ranked matrix: a tier plus, for non-apex tiers, a
/// division. Used as the resumable discovery cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierDivision {
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<Division>,
}

impl TierDivision {
    /// Apex bucket (no division).
    #[must_use]
    pub fn apex(tier: Tier) -> Self {
        Self {
            tier,
            division: None,
        }
    }

    /// Non-apex bucket.
    #[must_use]
    pub fn divided(tier: Tier, division: Division) -> Self {
        Self {
            tier,
            division: Some(division),
        }
    }
}

impl std::fmt::Display for TierDivision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.division {
            Some(division) => write!(f, "{}/{}", self.tier, division),
            None => write!(f, "{}", self.tier),
        }
    }
}

/// Enumerate the ranked matrix for the selected tiers, apex leagues first,
/// then descending tier and division order. This is the deterministic
/// traversal order player discovery walks and checkpoints against.
#[must_use]
pub fn ladder(tiers: &[Tier]) -> Vec<TierDivision> {
    let mut buckets = Vec::new();
    for tier in Tier::ALL.iter().rev().copied() {
        if !tiers.contains(&tier) {
            continue;
        }
        if tier.is_apex() {
            buckets.push(TierDivision::apex(tier));
        } else {
            for division in Division::ALL {
                buckets.push(TierDivision::divided(tier, division));
            }
        }
    }
    buckets
}
