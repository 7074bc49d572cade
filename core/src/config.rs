//! Client configuration.
//!
//! A `Config` is built once and never changes for the lifetime of a client.
//! Values come from:
//! 1. Defaults
//! 2. Environment variables (`READWISE_*`), via `Config::from_env`
//! 3. Explicit builder calls, which win over both

use std::time::Duration;

use crate::error::{Error, Result};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://readwise.io/api/v3";

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "READWISE_ACCESS_TOKEN";

/// Environment variable overriding the API root.
pub const BASE_URL_ENV: &str = "READWISE_READER_BASE_URL";

/// Environment variable overriding the timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "READWISE_READER_TIMEOUT_SECS";

/// Transport settings shared by every call a client makes.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    base_url: String,
    token: String,
    timeout: Duration,
}

impl Config {
    /// Configuration for the production API. Fails if `token` is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::invalid_token("token cannot be empty"));
        }
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load from `READWISE_ACCESS_TOKEN`, applying the optional base URL and
    /// timeout overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(TOKEN_ENV)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::invalid_token(format!("{TOKEN_ENV} not set")))?;
        let mut config = Self::new(token)?;

        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.is_empty()) {
            config = config.with_base_url(&base_url);
        }

        if let Some(secs) = lookup(TIMEOUT_ENV).filter(|secs| !secs.is_empty()) {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::invalid_parameter(format!(
                    "{TIMEOUT_ENV} must be a whole number of seconds, got {secs:?}"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Point the client at another API root, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// Keeps the token out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
