//! Client configuration
//!
//! A [`ClientConfig`] describes one Review Board server and how to talk to
//! it. It can be written by hand in YAML, loaded from a file, or built in
//! code, and turns into an [`HttpTransportConfig`] for the transport.

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpTransportConfig, RateLimiterConfig};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server root, e.g. `https://reviews.example.com`
    pub base_url: String,

    /// Account sent as basic auth with every request
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Accept self-signed certificates
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Number of items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Rate limiting; unlimited when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("{}/{}", crate::NAME, crate::VERSION)
}

impl ClientConfig {
    /// Config for `base_url` with every other field at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            accept_invalid_certs: false,
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            rate_limit: None,
            user_agent: default_user_agent(),
        }
    }

    /// Set the login credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_config("base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.page_size == 0 {
            return Err(Error::invalid_config("page_size", "must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_config("timeout_secs", "must be greater than 0"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(Error::missing_field("username"));
        }
        if self.backoff.initial_ms > self.backoff.max_ms {
            return Err(Error::invalid_config(
                "backoff",
                "initial_ms must not exceed max_ms",
            ));
        }

        Ok(())
    }

    /// Credentials, when both halves are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Transport settings derived from this config
    pub fn http_config(&self) -> HttpTransportConfig {
        let mut builder = HttpTransportConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff.backoff_type,
                Duration::from_millis(self.backoff.initial_ms),
                Duration::from_millis(self.backoff.max_ms),
            )
            .user_agent(&self.user_agent)
            .accept_invalid_certs(self.accept_invalid_certs);

        if let Some((username, password)) = self.credentials() {
            builder = builder.credentials(username, password);
        }

        builder = match &self.rate_limit {
            Some(rate_limit) => builder.rate_limit(rate_limit.clone()),
            None => builder.no_rate_limit(),
        };

        builder.build()
    }
}

// ============================================================================
// Backoff
// ============================================================================

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}
