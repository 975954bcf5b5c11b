//! Cycle time windows.
//!
//! A match belongs to a cycle when its `game_datetime` lies within the
//! half-open window `[start_ms, end_ms)`.

use chrono::Days;
use serde::{Deserialize, Serialize};

use crate::artifact::CollectionMethod;
use crate::ids::CycleId;

/// Half-open UTC window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl CycleWindow {
    /// Window for a cycle under the given collection method.
    ///
    /// `daily` covers the cycle date itself; `weekly` covers the seven UTC
    /// days ending at the end of the cycle date.
    #[must_use]
    pub fn for_cycle(cycle: &CycleId, method: CollectionMethod) -> Self {
        let date = cycle.date();
        let end = date
            .checked_add_days(Days::new(1))
            .unwrap_or(date)
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        let days_back = match method {
            CollectionMethod::Daily | CollectionMethod::Incremental => 1,
            CollectionMethod::Weekly => 7,
        };
        let start = date
            .checked_add_days(Days::new(1))
            .and_then(|d| d.checked_sub_days(Days::new(days_back)))
            .unwrap_or(date)
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self {
            start_ms: start,
            end_ms: end,
        }
    }

    /// Whether a `game_datetime` falls inside this window.
    #[must_use]
    pub fn contains(&self, game_datetime_ms: i64) -> bool {
        self.start_ms <= game_datetime_ms && game_datetime_ms < self.end_ms
    }

    /// Window start in epoch seconds (match-history endpoints take seconds).
    #[must_use]
    pub fn start_seconds(&self) -> i64 {
        self.start_ms / 1_000
    }

    /// Window end in epoch seconds.
    #[must_use]
    pub fn end_seconds(&self) -> i64 {
        self.end_ms / 1_000
    }
}
