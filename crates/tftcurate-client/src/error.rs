//! Typed API error model.
//!
//! Terminal conditions surface here; retryable ones (429, 5xx, transport)
//! are absorbed by [`RiotClient`](crate::RiotClient) until its retry caps
//! are exhausted.

use tftcurate_types::error::ErrorCategory;

/// Failure of an API request after the client's own retry policy ran.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Credential rejected (401/403). The caller must checkpoint and
    /// terminate; never retried.
    #[error("credential rejected ({status}): {url}")]
    AuthExpired { status: u16, url: String },

    /// 404 for a referenced resource; never retried.
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// Upstream 5xx that survived the retry cap.
    #[error("server error {status} after {attempts} attempts: {url}")]
    Server {
        status: u16,
        attempts: u32,
        url: String,
    },

    /// Timeout, DNS failure, or connection error that survived the
    /// retry cap.
    #[error("transport failure after {attempts} attempts: {url}: {message}")]
    Transport {
        attempts: u32,
        url: String,
        message: String,
    },

    /// 429 responses exceeded the rate-limit retry cap; escalated to the
    /// transport category.
    #[error("rate-limit retries exhausted: {url}")]
    RateLimitExhausted { url: String },

    /// Response body did not decode to the endpoint's record shape.
    #[error("malformed response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Status code outside the classification table; never retried.
    #[error("unexpected status {status}: {url}")]
    Unexpected { status: u16, url: String },

    /// The client itself could not be constructed or was misused.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Map into the shared accounting taxonomy.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthExpired { .. } => ErrorCategory::AuthExpired,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Server { .. } => ErrorCategory::Server5xx,
            // Exhausted rate-limit retries escalate to transport.
            Self::Transport { .. }
            | Self::RateLimitExhausted { .. }
            | Self::Unexpected { .. }
            | Self::InvalidRequest(_) => ErrorCategory::Transport,
            Self::Parse { .. } => ErrorCategory::Parse,
        }
    }

    /// Whether the cycle must stop and checkpoint on this error.
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let auth = ApiError::AuthExpired {
            status: 403,
            url: "u".into(),
        };
        assert_eq!(auth.category(), ErrorCategory::AuthExpired);
        assert!(auth.is_auth_expired());

        let exhausted = ApiError::RateLimitExhausted { url: "u".into() };
        assert_eq!(exhausted.category(), ErrorCategory::Transport);

        let not_found = ApiError::NotFound { url: "u".into() };
        assert_eq!(not_found.category(), ErrorCategory::NotFound);
        assert!(!not_found.is_auth_expired());
    }

    #[test]
    fn display_carries_url_and_attempts() {
        let err = ApiError::Server {
            status: 503,
            attempts: 4,
            url: "https://x/y".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("https://x/y"));
    }
}
