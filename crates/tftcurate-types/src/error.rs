//! Error taxonomy shared by the client, registry, and engine.
//!
//! Categories drive retry decisions, registry `last_error_category`
//! columns, and the artifact's `error_summary` keys.

use serde::{Deserialize, Serialize};

/// Failure classification used in error accounting and the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ErrorCategory {
    /// Credential rejected (401/403). Terminal for the cycle, resumable.
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired,
    /// 429 budget violation that survived the client's transparent retries.
    #[serde(rename = "RATE_LIMITED")]
    RateLimited,
    /// 404 for a resource the API itself referenced.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Upstream 5xx after retries.
    #[serde(rename = "SERVER_5XX")]
    Server5xx,
    /// Timeout, DNS failure, connection reset, or retry exhaustion.
    #[serde(rename = "TRANSPORT")]
    Transport,
    /// Response body did not decode to the expected shape.
    #[serde(rename = "PARSE")]
    Parse,
    /// The artifact failed its own invariants at emit.
    #[serde(rename = "INVARIANT_VIOLATION")]
    InvariantViolation,
}

impl ErrorCategory {
    /// Wire/storage string for the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::RateLimited => "RATE_LIMITED",
            Self::NotFound => "NOT_FOUND",
            Self::Server5xx => "SERVER_5XX",
            Self::Transport => "TRANSPORT",
            Self::Parse => "PARSE",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
        }
    }

    /// Parse a storage string back into a category.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AUTH_EXPIRED" => Some(Self::AuthExpired),
            "RATE_LIMITED" => Some(Self::RateLimited),
            "NOT_FOUND" => Some(Self::NotFound),
            "SERVER_5XX" => Some(Self::Server5xx),
            "TRANSPORT" => Some(Self::Transport),
            "PARSE" => Some(Self::Parse),
            "INVARIANT_VIOLATION" => Some(Self::InvariantViolation),
            _ => None,
        }
    }

    /// Whether a match that failed with this category should be fetched
    /// again by the automatic retry sweep.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Server5xx | Self::Transport)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
