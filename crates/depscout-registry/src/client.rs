//! HTTP client wrapper with optional rate limiting

use crate::error::{Error, Result};
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter shared by all requests of one client
pub type RegistryRateLimiter = Arc<
    RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client wrapper for registry requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<RegistryRateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client without rate limiting
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            rate_limiter: None,
        })
    }

    /// Create a new HTTP client with rate limiting
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum requests per second; zero disables limiting
    /// * `timeout` - Per-request timeout
    pub fn with_rate_limit(requests_per_second: u32, timeout: Duration) -> Result<Self> {
        let rate_limiter = NonZeroU32::new(requests_per_second)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client: build_client(timeout)?,
            rate_limiter,
        })
    }

    /// Wait for rate limiter if enabled
    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Make a GET request with custom headers and parse the JSON body
    ///
    /// `Accept: application/json` is always sent.
    pub async fn get_json_with_headers(
        &self,
        url: &str,
        mut headers: HeaderMap,
    ) -> Result<serde_json::Value> {
        let url = url::Url::parse(url)?;
        self.wait_for_rate_limit().await;

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let response = self.client.get(url.clone()).headers(headers).send().await?;

        // Handle rate limiting (HTTP 429)
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimitExceeded(url.to_string()));
        }

        if !response.status().is_success() {
            return Err(Error::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(format!("depscout/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}
