//! Package registry lookups for depscout
//!
//! Fetches the published SHA-1 of a package version from an npm-compatible
//! registry, sending the right credentials for the registry kind.
//!
//! # Example
//!
//! ```no_run
//! use depscout_registry::{RegistryClient, RegistryClientConfig, RegistryKind, ShasumQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistryClient::new(RegistryClientConfig::default())?;
//! let query = ShasumQuery {
//!     locator: "https://registry.npmjs.org/lodash/4.17.21".to_string(),
//!     scoped: false,
//!     version: "4.17.21".to_string(),
//!     kind: RegistryKind::Default,
//! };
//! let shasum = client.fetch_shasum(&query).await?;
//! println!("{shasum:?}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod npm;
pub mod types;

pub use client::HttpClient;
pub use error::{Error, Result};
pub use types::{
    authorization_header, request_url, RegistryKind, ShasumQuery, SCOPED_SEPARATOR,
    SCOPE_SEPARATOR_PLACEHOLDER,
};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;

/// Settings for [`RegistryClient`]
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    pub timeout: Duration,
    /// Zero disables rate limiting
    pub requests_per_second: u32,
    pub access_token: Option<String>,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            timeout: client::DEFAULT_TIMEOUT,
            requests_per_second: 0,
            access_token: None,
        }
    }
}

/// Registry checksum client.
///
/// Cheap to clone; clones share the connection pool and rate limiter.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
    access_token: Option<String>,
}

impl RegistryClient {
    pub fn new(config: RegistryClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_rate_limit(config.requests_per_second, config.timeout)?,
            access_token: config.access_token,
        })
    }

    /// Look up the published shasum for one package version.
    ///
    /// Returns `Ok(None)` when the registry cannot be reached or answers
    /// outside 2xx. A 2xx answer without the expected keys is an error.
    pub async fn fetch_shasum(&self, query: &ShasumQuery) -> Result<Option<String>> {
        let url = query.request_url();

        let mut headers = HeaderMap::new();
        if let Some(value) = authorization_header(query.kind, self.access_token.as_deref()) {
            let value = HeaderValue::from_str(&value)
                .map_err(|e| Error::other(format!("Invalid access token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        match self.http.get_json_with_headers(&url, headers).await {
            Ok(body) => npm::extract_shasum(&body, query.scoped, &query.version, &url).map(Some),
            Err(e) if e.is_unreachable() => {
                tracing::debug!(url = %url, error = %e, "Registry lookup failed, leaving checksum empty");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
