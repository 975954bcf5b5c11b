//! Rate-limited HTTP client for the upstream Riot API.
//!
//! Enforces the dual-window request budget proactively, classifies
//! responses into the shared error taxonomy, and retries transparently
//! where the taxonomy allows it. One client (and one token-bucket pair)
//! per region; all collector workers share it.

#![warn(clippy::pedantic)]

pub mod error;
pub mod http;
pub mod rate_limit;

mod endpoints;

// Top-level re-exports for convenience.
pub use error::ApiError;
pub use http::{ClientConfig, RiotClient};
pub use rate_limit::{LimiterStats, RateLimitConfig, RateLimiter};
