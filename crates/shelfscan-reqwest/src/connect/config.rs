//! Configuration for the shelfscan HTTP client.

use std::time::Duration;

use shelfscan_core::{Error, Result};
use url::Url;

/// Default base URL of the recognition API.
pub const DEFAULT_BASE_URL: &str = "https://api.shelfscan.dev/v2";

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "SHELFSCAN_API_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "SHELFSCAN_API_KEY";

/// Configuration for [`ScanClient`](crate::ScanClient).
///
/// The API key is mandatory: the service rejects anonymous requests, so a
/// missing key is a fatal configuration error at construction time rather
/// than a 401 on the first call.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use shelfscan_reqwest::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .base_url("https://api.shelfscan.dev/v2")
///     .api_key("my-secret-key")
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL of the recognition API.
    base_url: Url,

    /// API key sent as the `X-API-Key` header.
    api_key: String,

    /// Request timeout duration.
    timeout: Duration,

    /// Connection timeout duration.
    connect_timeout: Duration,

    /// User agent string for HTTP requests.
    user_agent: String,
}

impl ScanConfig {
    /// Create a configuration with the given base URL and API key.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            Error::config(format!("Invalid base URL '{}': {}", base_url.as_ref(), e))
        })?;

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("API key must not be empty"));
        }

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("shelfscan/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Create a configuration builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a configuration from the environment.
    ///
    /// Reads the base URL from `SHELFSCAN_API_URL` (falling back to
    /// [`DEFAULT_BASE_URL`]) and the key from `SHELFSCAN_API_KEY`. A missing
    /// or empty key is a fatal configuration error.
    pub fn from_env() -> Result<Self> {
        Self::from_env_vars(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_API_KEY).ok(),
        )
    }

    fn from_env_vars(base_url: Option<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config(format!("{} is not set", ENV_API_KEY)))?;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, api_key)
    }

    /// Get the base URL of the recognition API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the user agent string.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ScanConfigBuilder {
    /// Set the base URL of the recognition API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns an error if the base URL is missing or invalid, or if the
    /// API key is missing or empty.
    pub fn build(self) -> Result<ScanConfig> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = self
            .api_key
            .ok_or_else(|| Error::config("API key is required"))?;

        let mut config = ScanConfig::new(base_url, api_key)?;

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            config = config.with_connect_timeout(connect_timeout);
        }
        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }

        Ok(config)
    }
}
