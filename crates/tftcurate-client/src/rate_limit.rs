//! Dual-window request budget.
//!
//! A single timestamp deque serves both windows: the short window counts
//! entries younger than one second, the long window everything younger
//! than two minutes. [`RateLimiter::acquire`] admits a request only when
//! both windows have room, sleeping otherwise; the proactive long-window
//! check keeps a configurable safety margin of slots free so a burst
//! never lands exactly on the budget boundary.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

const SHORT_WINDOW: Duration = Duration::from_secs(1);
const LONG_WINDOW: Duration = Duration::from_secs(120);

/// Budget configuration for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per second.
    pub requests_per_second: u32,
    /// Requests admitted per two-minute window.
    pub requests_per_two_minutes: u32,
    /// Long-window slots kept free by the proactive check.
    pub safety_margin: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 20,
            requests_per_two_minutes: 100,
            safety_margin: 1,
        }
    }
}

/// Counters for summary logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimiterStats {
    pub total_requests: u64,
    pub short_window_waits: u64,
    pub long_window_waits: u64,
}

#[derive(Debug, Default)]
struct LimiterState {
    timestamps: VecDeque<Instant>,
    stats: LimiterStats,
}

impl LimiterState {
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) >= LONG_WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn short_count(&self, now: Instant) -> u32 {
        let count = self
            .timestamps
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) < SHORT_WINDOW)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Shared dual-window limiter; one instance per region.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Wait until both windows admit a request, then record it.
    pub async fn acquire(&self) {
        loop {
            let wait_until = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                state.prune(now);

                if let Some(deadline) = self.next_deadline(&mut state, now) {
                    Some(deadline)
                } else {
                    state.timestamps.push_back(now);
                    state.stats.total_requests += 1;
                    None
                }
            };

            match wait_until {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => return,
            }
        }
    }

    /// Earliest instant at which a request could be admitted, or `None`
    /// if one is admissible right now.
    fn next_deadline(&self, state: &mut LimiterState, now: Instant) -> Option<Instant> {
        if state.short_count(now) >= self.config.requests_per_second {
            state.stats.short_window_waits += 1;
            let oldest_in_short = state
                .timestamps
                .iter()
                .rev()
                .take_while(|t| now.duration_since(**t) < SHORT_WINDOW)
                .last()
                .copied()?;
            return Some(oldest_in_short + SHORT_WINDOW);
        }

        let long_count = u32::try_from(state.timestamps.len()).unwrap_or(u32::MAX);
        let available = self.config.requests_per_two_minutes.saturating_sub(long_count);
        // Slots that must age out before a request may be admitted: keep
        // the safety margin free, and never exceed the hard budget.
        let deficit = self
            .config
            .safety_margin
            .saturating_sub(available)
            .max(u32::from(available == 0));
        if deficit > 0 {
            state.stats.long_window_waits += 1;
            let slot = state.timestamps.get(deficit as usize - 1).copied()?;
            return Some(slot + LONG_WINDOW);
        }

        None
    }

    /// Snapshot of limiter counters.
    pub async fn stats(&self) -> LimiterStats {
        self.state.lock().await.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rps: u32, per_two_min: u32, margin: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_second: rps,
            requests_per_two_minutes: per_two_min,
            safety_margin: margin,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_short_budget_without_waiting() {
        let limiter = limiter(5, 100, 1);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now() - start, Duration::ZERO);
        let stats = limiter.stats().await;
        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.short_window_waits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sixth_request_waits_for_short_window() {
        let limiter = limiter(5, 100, 1);
        let start = Instant::now();
        for _ in 0..6 {
            limiter.acquire().await;
        }
        let elapsed = Instant::now() - start;
        assert!(elapsed >= SHORT_WINDOW, "elapsed {elapsed:?}");
        assert!(limiter.stats().await.short_window_waits >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_long_window_blocks_until_it_advances() {
        let limiter = limiter(100, 3, 1);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now() - start, Duration::ZERO);

        // Budget spent: no request may go out until the window advances.
        limiter.acquire().await;
        let elapsed = Instant::now() - start;
        assert!(elapsed >= LONG_WINDOW, "elapsed {elapsed:?}");
        assert!(limiter.stats().await.long_window_waits >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn proactive_margin_refuses_final_slots() {
        // Margin 2 keeps two slots free: only 3 of the 4 budget slots are
        // consumable before the proactive check sleeps.
        let limiter = limiter(100, 4, 2);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now() - start, Duration::ZERO);

        limiter.acquire().await;
        assert!(Instant::now() - start >= LONG_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_margin_still_enforces_hard_budget() {
        let limiter = limiter(100, 3, 0);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now() - start, Duration::ZERO);

        limiter.acquire().await;
        assert!(Instant::now() - start >= LONG_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn short_window_frees_after_a_second() {
        let limiter = limiter(2, 100, 1);
        limiter.acquire().await;
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }
}
