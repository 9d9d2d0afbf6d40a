//! Blocking HTTP transport with retry and rate limiting
//!
//! Implements [`Transport`] over `reqwest::blocking`:
//! - Automatic retries with configurable backoff
//! - Rate limiting to prevent server throttling
//! - Session cookies kept across calls after [`Transport::login`]
//! - Error classification for retry decisions

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::decode::checked_root;
use crate::error::{is_retryable_status, Error, Result};
use crate::progress::Progress;
use crate::transport::Transport;
use crate::types::BackoffType;
use bytes::Bytes;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Path of the web API root
const API_ROOT: &str = "api/";

/// Path of the session resource used to log in
const SESSION_PATH: &str = "api/session/";

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Server root, e.g. `https://reviews.example.com/`
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Accept self-signed or otherwise invalid certificates
    pub accept_invalid_certs: bool,
    /// Basic-auth credentials sent with every request
    pub credentials: Option<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("reviewboard-client/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
            credentials: None,
        }
    }
}

impl HttpTransportConfig {
    /// Create a new config builder
    pub fn builder() -> HttpTransportConfigBuilder {
        HttpTransportConfigBuilder::default()
    }
}

/// Builder for HTTP transport config
#[derive(Default)]
pub struct HttpTransportConfigBuilder {
    config: HttpTransportConfig,
}

impl HttpTransportConfigBuilder {
    /// Set the server root URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Accept invalid TLS certificates
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Send basic-auth credentials with every request
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Build the config
    pub fn build(self) -> HttpTransportConfig {
        self.config
    }
}

/// Blocking HTTP transport with retry and rate limiting
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    config: HttpTransportConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Create a transport from its configuration
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(header_map(&config.default_headers)?)
            .cookie_store(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            base_url,
            config,
            rate_limiter,
        })
    }

    /// Server root every relative path is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Resolve a server-relative path (with optional query) to a full URL
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::encoding(format!("{path}: {e}")))
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }

    /// Send a request, retrying transient failures.
    ///
    /// `prepare` is applied to a fresh builder on every attempt. Retrying
    /// stops as soon as `progress` reports cancellation.
    fn execute<F>(
        &self,
        method: Method,
        path: &str,
        progress: &dyn Progress,
        prepare: F,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let credentials = self
            .config
            .credentials
            .as_ref()
            .map(|(username, password)| (username.as_str(), password.as_str()));
        self.execute_as(method, path, credentials, progress, prepare)
    }

    fn execute_as<F>(
        &self,
        method: Method,
        path: &str,
        credentials: Option<(&str, &str)>,
        progress: &dyn Progress,
        prepare: F,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.resolve(path)?;
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait();
            }

            let mut req = self.client.request(method.clone(), url.clone());
            if let Some((username, password)) = credentials {
                req = req.basic_auth(username, Some(password));
            }
            req = prepare(req);

            debug!(%method, %url, attempt, "Sending request");

            let (error, retry_after) = match req.send() {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retry_after = extract_retry_after(&response);
                    let body = response.text().unwrap_or_default();
                    if !is_retryable_status(status.as_u16()) {
                        return Err(status_error(status, body));
                    }
                    (Error::http_status(status.as_u16(), body), retry_after)
                }
                Err(e) if e.is_timeout() => {
                    #[allow(clippy::cast_possible_truncation)]
                    let timeout_ms = self.config.timeout.as_millis() as u64;
                    (Error::Timeout { timeout_ms }, None)
                }
                Err(e) if e.is_connect() => (Error::Http(e), None),
                Err(e) => return Err(Error::Http(e)),
            };

            if attempt >= max_retries {
                if max_retries > 0 {
                    warn!(%url, max_retries, "Giving up after retries: {error}");
                }
                return Err(error);
            }
            if progress.is_cancelled() {
                debug!(%url, "Cancelled, not retrying");
                return Err(error);
            }

            let delay = match retry_after {
                Some(after) => after.min(self.config.max_backoff),
                None => self.calculate_backoff(attempt),
            };
            warn!(
                "{error}, attempt {}/{}, retrying in {:?}",
                attempt + 1,
                max_retries + 1,
                delay
            );
            std::thread::sleep(delay);
            attempt += 1;
        }
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, path: &str, progress: &dyn Progress) -> Result<String> {
        let response = self.execute(Method::GET, path, progress, |req| req)?;
        Ok(response.text()?)
    }

    fn get_bytes(&self, path: &str, mime_type: &str, progress: &dyn Progress) -> Result<Bytes> {
        let response = self.execute(Method::GET, path, progress, |req| {
            req.header(ACCEPT, mime_type)
        })?;
        Ok(response.bytes()?)
    }

    fn put_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
        progress: &dyn Progress,
    ) -> Result<String> {
        let response = self.execute(Method::PUT, path, progress, |req| req.form(params))?;
        Ok(response.text()?)
    }

    fn api_entry_point_exists(&self, progress: &dyn Progress) -> Result<bool> {
        match self.execute(Method::GET, API_ROOT, progress, |req| req) {
            Ok(response) => Ok(response.status() == StatusCode::OK),
            Err(Error::HttpStatus { status, .. }) => {
                debug!(status, "API entry point not found");
                Ok(false)
            }
            Err(Error::ServerReported { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn login(&self, username: &str, password: &str, progress: &dyn Progress) -> Result<()> {
        let credentials = Some((username, password));
        let response =
            self.execute_as(Method::GET, SESSION_PATH, credentials, progress, |req| req)?;
        checked_root(&response.text()?)?;
        debug!(username, "Logged in");
        Ok(())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.config.max_retries)
            .field("has_credentials", &self.config.credentials.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::invalid_config("default_headers", format!("{key}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_config("default_headers", format!("{key}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Error for a non-retryable status.
///
/// The server explains most client errors with a `stat: fail` envelope;
/// that message is more useful than the bare status.
fn status_error(status: StatusCode, body: String) -> Error {
    if status.is_client_error() {
        if let Err(err @ Error::ServerReported { .. }) = checked_root(&body) {
            return err;
        }
    }
    Error::http_status(status.as_u16(), body)
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}
