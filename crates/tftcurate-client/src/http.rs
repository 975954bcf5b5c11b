//! Rate-limited request execution and response classification.

use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use tftcurate_types::ids::Region;

use crate::error::ApiError;
use crate::rate_limit::{LimiterStats, RateLimitConfig, RateLimiter};

/// Header carrying the API credential.
const API_KEY_HEADER: &str = "X-Riot-Token";

/// Client construction and retry policy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub region: Region,
    pub rate_limit: RateLimitConfig,
    /// Hard per-request timeout.
    pub request_timeout: Duration,
    /// Retry cap for 5xx and transport failures.
    pub max_retries: u32,
    /// Retry cap for 429 responses before escalating to transport.
    pub max_rate_limit_retries: u32,
    /// First backoff delay; doubles per attempt.
    pub backoff_base: Duration,
    /// Backoff ceiling, also applied to `Retry-After` hints.
    pub backoff_cap: Duration,
    /// Test override for the platform host base URL.
    pub platform_base: Option<String>,
    /// Test override for the regional host base URL.
    pub regional_base: Option<String>,
}

impl ClientConfig {
    /// Default policy for a region and credential.
    #[must_use]
    pub fn new(api_key: impl Into<String>, region: Region) -> Self {
        Self {
            api_key: api_key.into(),
            region,
            rate_limit: RateLimitConfig::default(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            max_rate_limit_retries: 10,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(120),
            platform_base: None,
            regional_base: None,
        }
    }
}

/// Shared, rate-limited client for one region.
///
/// Cheap to share behind `Arc`; the limiter and connection pool are the
/// shared state.
pub struct RiotClient {
    http: reqwest::Client,
    limiter: RateLimiter,
    config: ClientConfig,
}

impl RiotClient {
    /// Build a client with the credential installed as a default header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut key_value = reqwest::header::HeaderValue::from_str(&config.api_key)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid api key: {e}")))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("http client build failed: {e}")))?;

        Ok(Self {
            http,
            limiter: RateLimiter::new(config.rate_limit),
            config,
        })
    }

    /// Base URL for platform-host endpoints (league, summoner).
    pub(crate) fn platform_base(&self) -> String {
        self.config
            .platform_base
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.config.region.platform_host()))
    }

    /// Base URL for regional-host endpoints (match).
    pub(crate) fn regional_base(&self) -> String {
        self.config
            .regional_base
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.config.region.regional_host()))
    }

    /// Region this client talks to.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.config.region
    }

    /// Limiter counters for summary logging.
    pub async fn limiter_stats(&self) -> LimiterStats {
        self.limiter.stats().await
    }

    /// Issue a rate-limited GET and decode the JSON body.
    ///
    /// Retries transparently per the classification table; terminal
    /// conditions return the typed error.
    ///
    /// # Errors
    ///
    /// See [`ApiError`] for the terminal conditions.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut attempts = 0u32;
        let mut rate_limit_retries = 0u32;

        loop {
            self.limiter.acquire().await;

            let response = self.http.get(url).query(query).send().await;
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    attempts += 1;
                    if attempts > self.config.max_retries {
                        return Err(ApiError::Transport {
                            attempts,
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                    let delay = self.backoff(attempts);
                    tracing::warn!(url, attempt = attempts, delay_ms = delay.as_millis() as u64,
                        "Transport error, will retry: {e}");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
                    attempts: attempts + 1,
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                return serde_json::from_slice(&bytes).map_err(|source| ApiError::Parse {
                    url: url.to_string(),
                    source,
                });
            }

            match status.as_u16() {
                401 | 403 => {
                    return Err(ApiError::AuthExpired {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                404 => {
                    return Err(ApiError::NotFound {
                        url: url.to_string(),
                    });
                }
                429 => {
                    rate_limit_retries += 1;
                    if rate_limit_retries > self.config.max_rate_limit_retries {
                        return Err(ApiError::RateLimitExhausted {
                            url: url.to_string(),
                        });
                    }
                    let delay = retry_after(&response)
                        .unwrap_or_else(|| self.backoff(rate_limit_retries))
                        .min(self.config.backoff_cap);
                    tracing::warn!(
                        url,
                        retry = rate_limit_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited (429), backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                s if s >= 500 => {
                    attempts += 1;
                    if attempts > self.config.max_retries {
                        return Err(ApiError::Server {
                            status: s,
                            attempts,
                            url: url.to_string(),
                        });
                    }
                    let delay = self.backoff(attempts);
                    tracing::warn!(url, status = s, attempt = attempts,
                        delay_ms = delay.as_millis() as u64, "Server error, will retry");
                    tokio::time::sleep(delay).await;
                }
                s => {
                    return Err(ApiError::Unexpected {
                        status: s,
                        url: url.to_string(),
                    });
                }
            }
        }
    }

    /// Exponential backoff with jitter, capped at the configured ceiling.
    fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.config.backoff_base.as_millis()).unwrap_or(1_000);
        let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let jitter = rand::thread_rng().gen_range(0..=exp / 3);
        Duration::from_millis(exp.saturating_add(jitter)).min(self.config.backoff_cap)
    }
}

/// Parse a `Retry-After` header in seconds, if present.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("RGAPI-test", Region::new("la2"))
    }

    #[test]
    fn default_policy_matches_contract() {
        let config = config();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_cap, Duration::from_secs(120));
    }

    #[test]
    fn hosts_derive_from_region() {
        let client = RiotClient::new(config()).unwrap();
        assert_eq!(client.platform_base(), "https://la2.api.riotgames.com");
        assert_eq!(client.regional_base(), "https://americas.api.riotgames.com");
    }

    #[test]
    fn base_overrides_win() {
        let mut config = config();
        config.platform_base = Some("http://127.0.0.1:9999".into());
        let client = RiotClient::new(config).unwrap();
        assert_eq!(client.platform_base(), "http://127.0.0.1:9999");
    }

    #[test]
    fn backoff_grows_and_respects_cap() {
        let mut config = config();
        config.backoff_base = Duration::from_millis(100);
        config.backoff_cap = Duration::from_millis(500);
        let client = RiotClient::new(config).unwrap();

        let first = client.backoff(1);
        assert!(first >= Duration::from_millis(100));
        let tenth = client.backoff(10);
        assert_eq!(tenth, Duration::from_millis(500));
    }
}
