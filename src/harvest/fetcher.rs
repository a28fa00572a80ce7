//! HTTP fetcher implementation
//!
//! This module handles every HTTP request the harvester makes, including:
//! - Building the HTTP client with the configured user agent
//! - Per-request timeouts
//! - Retry logic with exponential backoff and jitter
//! - Error classification

use crate::config::FetchConfig;
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(300);

/// Classified outcome of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server answered with a success status and the body was read
    Success,
    /// The server answered 404; never retried
    NotFound,
    /// A single attempt failed in a way that may succeed later
    TransientFailure,
    /// Every allowed attempt failed transiently
    ExhaustedRetries,
}

/// Result of a complete fetch (all attempts for one URL)
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The requested URL
    pub url: String,
    /// Response body, present only on success
    pub body: Option<String>,
    /// Final classification
    pub outcome: FetchOutcome,
    /// Number of HTTP requests sent
    pub attempts: u32,
}

/// Why a single attempt failed
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("Timeout error")]
    Timeout,

    #[error("Connection error: {0}")]
    Connect(reqwest::Error),

    #[error("Request error: {0}")]
    Request(reqwest::Error),
}

impl AttemptError {
    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Maps this failure onto the fetch outcome taxonomy
    pub fn outcome(&self) -> FetchOutcome {
        if self.is_retryable() {
            FetchOutcome::TransientFailure
        } else {
            FetchOutcome::NotFound
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e)
        } else {
            Self::Request(e)
        }
    }
}

/// Retry, timeout and backoff policy applied to every fetch
///
/// The delay before the retry that follows a failed attempt at index `a`
/// (0-based) is `backoff_unit * (backoff_base^a + U(0, 1))`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Exponential growth factor
    pub backoff_base: f64,
    /// Scale of one backoff step
    pub backoff_unit: Duration,
    /// Whether to add uniform random jitter in `[0, 1)` steps
    pub jitter: bool,
}

impl RetryPolicy {
    /// Builds the policy described by the `[fetch]` configuration section
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
            backoff_base: config.backoff_base,
            backoff_unit: Duration::from_secs(1),
            jitter: true,
        }
    }

    /// Total number of attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Computes the delay after a failed attempt at the given 0-based index
    ///
    /// The result never exceeds [`MAX_BACKOFF_DELAY`].
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.backoff_unit.is_zero() {
            return Duration::ZERO;
        }
        let jitter = if self.jitter {
            rand::thread_rng().gen_range(0.0..1.0)
        } else {
            0.0
        };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_unit.as_secs_f64() * (self.backoff_base.powi(exponent) + jitter);
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(MAX_BACKOFF_DELAY))
            .unwrap_or(MAX_BACKOFF_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Builds an HTTP client sending the given user agent
///
/// Timeouts are applied per request by the [`Fetcher`], not on the client.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches documents with retry and backoff
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Creates a fetcher from the `[fetch]` configuration section
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::new(client, RetryPolicy::from_config(config)))
    }

    /// Fetches a URL, returning its body or `None` on any failure
    ///
    /// Not-found and exhausted retries are indistinguishable here; use
    /// [`Fetcher::fetch_with_result`] for the classification.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        self.fetch_with_result(url).await.body
    }

    /// Fetches a URL with full retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 404 | Immediate → NotFound |
    /// | Other HTTP status | Retry with backoff |
    /// | Timeout | Retry with backoff |
    /// | Connection failure | Retry with backoff |
    ///
    /// After `max_retries + 1` failed attempts the result is `ExhaustedRetries`.
    pub async fn fetch_with_result(&self, url: &str) -> FetchResult {
        let max_attempts = self.policy.max_attempts();

        for attempt in 0..max_attempts {
            tracing::debug!(
                url = url,
                attempt = attempt + 1,
                max_attempts = max_attempts,
                "Fetching"
            );

            match self.attempt(url).await {
                Ok(body) => {
                    if attempt > 0 {
                        tracing::info!(url = url, attempts = attempt + 1, "Fetch succeeded after retry");
                    }
                    return FetchResult {
                        url: url.to_string(),
                        body: Some(body),
                        outcome: FetchOutcome::Success,
                        attempts: attempt + 1,
                    };
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(url = url, "Resource not found (404): {}", url);
                    return FetchResult {
                        url: url.to_string(),
                        body: None,
                        outcome: e.outcome(),
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        url = url,
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        error = %e,
                        "Failed to fetch {}",
                        url
                    );
                }
            }

            if attempt + 1 < max_attempts {
                let delay = self.policy.backoff_delay(attempt);
                tracing::info!(
                    url = url,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying in {:.2} seconds...",
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            url = url,
            attempts = max_attempts,
            "Failed to fetch {} after {} attempts",
            url,
            max_attempts
        );

        FetchResult {
            url: url.to_string(),
            body: None,
            outcome: FetchOutcome::ExhaustedRetries,
            attempts: max_attempts,
        }
    }

    /// Sends one GET request and reads the body
    async fn attempt(&self, url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .timeout(self.policy.timeout)
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError::NotFound);
        }
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        response.text().await.map_err(AttemptError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A policy with millisecond backoff steps and no jitter
    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            timeout: Duration::from_millis(500),
            backoff_base: 2.0,
            backoff_unit: Duration::from_millis(10),
            jitter: false,
        }
    }

    fn test_fetcher(policy: RetryPolicy) -> Fetcher {
        let client = build_http_client("TestHarvester/1.0").unwrap();
        Fetcher::new(client, policy)
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client("TestHarvester/1.0").is_ok());
    }

    #[test]
    fn test_default_policy_matches_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.backoff_base, 2.0);
        assert!(policy.jitter);
    }

    #[test]
    fn test_backoff_delay_grows_exponentially() {
        let policy = RetryPolicy {
            backoff_unit: Duration::from_secs(1),
            ..fast_policy(3)
        };

        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_jitter_stays_within_one_step() {
        let policy = RetryPolicy {
            backoff_unit: Duration::from_secs(1),
            jitter: true,
            ..fast_policy(3)
        };

        for _ in 0..100 {
            let delay = policy.backoff_delay(2);
            assert!(delay >= Duration::from_secs(4));
            assert!(delay < Duration::from_secs(5));
        }
    }

    #[test]
    fn test_backoff_delay_is_capped_for_large_base() {
        let policy = RetryPolicy {
            max_retries: 10,
            backoff_base: 1000.0,
            backoff_unit: Duration::from_secs(1),
            jitter: true,
            ..fast_policy(10)
        };

        assert!(policy.backoff_delay(0) < Duration::from_secs(2));
        for attempt in 1..=policy.max_retries {
            assert_eq!(policy.backoff_delay(attempt), MAX_BACKOFF_DELAY);
        }
    }

    #[test]
    fn test_backoff_delay_is_capped_for_huge_unit() {
        let policy = RetryPolicy {
            backoff_unit: Duration::from_secs(u64::MAX),
            ..fast_policy(3)
        };

        assert_eq!(policy.backoff_delay(0), MAX_BACKOFF_DELAY);
        assert_eq!(policy.backoff_delay(u32::MAX), MAX_BACKOFF_DELAY);
    }

    #[test]
    fn test_attempt_error_classification() {
        assert!(!AttemptError::NotFound.is_retryable());
        assert_eq!(AttemptError::NotFound.outcome(), FetchOutcome::NotFound);

        let status = AttemptError::Status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(status.is_retryable());
        assert_eq!(status.outcome(), FetchOutcome::TransientFailure);
        assert!(AttemptError::Timeout.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Doc"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(fast_policy(3));
        let result = fetcher
            .fetch_with_result(&format!("{}/doc.md", server.uri()))
            .await;

        assert_eq!(result.outcome, FetchOutcome::Success);
        assert_eq!(result.body.as_deref(), Some("# Doc"));
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.md"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        // Backoff of a full second per step would show up in the elapsed time
        let policy = RetryPolicy {
            backoff_unit: Duration::from_secs(1),
            ..fast_policy(3)
        };
        let fetcher = test_fetcher(policy);

        let start = Instant::now();
        let result = fetcher
            .fetch_with_result(&format!("{}/missing.md", server.uri()))
            .await;

        assert_eq!(result.outcome, FetchOutcome::NotFound);
        assert!(result.body.is_none());
        assert_eq!(result.attempts, 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_fetch_timeout_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.md"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            timeout: Duration::from_millis(100),
            ..fast_policy(2)
        };
        let fetcher = test_fetcher(policy);

        let start = Instant::now();
        let result = fetcher
            .fetch_with_result(&format!("{}/slow.md", server.uri()))
            .await;
        let elapsed = start.elapsed();

        assert_eq!(result.outcome, FetchOutcome::ExhaustedRetries);
        assert!(result.body.is_none());
        assert_eq!(result.attempts, 3);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);

        // Three timeouts plus backoff sleeps of 10ms and 20ms between them
        assert!(elapsed >= Duration::from_millis(3 * 100 + 30));
    }

    #[tokio::test]
    async fn test_fetch_server_error_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky.md"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(fast_policy(3));
        let result = fetcher
            .fetch_with_result(&format!("{}/flaky.md", server.uri()))
            .await;

        assert_eq!(result.outcome, FetchOutcome::Success);
        assert_eq!(result.body.as_deref(), Some("recovered"));
        assert_eq!(result.attempts, 2);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_with_zero_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(fast_policy(0));
        let body = fetcher.fetch(&format!("{}/broken.md", server.uri())).await;

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = test_fetcher(fast_policy(1));
        let result = fetcher
            .fetch_with_result(&format!("http://{}/doc.md", addr))
            .await;

        assert_eq!(result.outcome, FetchOutcome::ExhaustedRetries);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("user-agent", "TestHarvester/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(fast_policy(0));
        let body = fetcher.fetch(&format!("{}/ua.md", server.uri())).await;

        assert_eq!(body.as_deref(), Some("ok"));
    }
}
