//! # Configuration
//!
//! Everything the helpers need to know about the remote service lives in an
//! explicit [`EtaConfig`] value handed to [`EtaClient`](crate::clients::EtaClient).
//! There is no process-wide state: two clients with different endpoints or
//! credentials can coexist in the same test binary.
//!
//! ```rust
//! use eta_wait::config::{Credentials, EtaConfig};
//! use std::time::Duration;
//!
//! let config = EtaConfig::default()
//!     .with_credentials(Credentials::new("key", "secret"))
//!     .with_wait_timeout(Duration::from_secs(10));
//!
//! assert_eq!(config.wait_timeout(), Duration::from_secs(10));
//! assert_eq!(config.api_url, eta_wait::config::DEFAULT_API_URL);
//! ```

use crate::error::ConfigError;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://emailtestautomation.herokuapp.com/api/v1";
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Smallest pause between two polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

const ENV_API_URL: &str = "ETA_API_URL";
const ENV_API_KEY: &str = "ETA_API_KEY";
const ENV_API_SECRET: &str = "ETA_API_SECRET";
const ENV_WAIT_TIMEOUT_MS: &str = "ETA_WAIT_TIMEOUT_MS";
const ENV_POLL_INTERVAL_MS: &str = "ETA_POLL_INTERVAL_MS";

/// API key pair used for authenticated calls.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Value of the `Authorization` header the service expects.
    pub fn authorization(&self) -> String {
        format!("Apikey {}:{}", self.key, self.secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Connection and timing settings for the email test automation service.
///
/// Durations are kept as [`Duration`]; milliseconds only appear at the
/// boundaries (`ETA_*_MS` variables, `*_ms` keys when deserialized).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EtaConfig {
    /// Base URL of the API, e.g. `https://emailtestautomation.herokuapp.com/api/v1`.
    pub api_url: String,
    /// Required by every authenticated operation.
    pub credentials: Option<Credentials>,
    #[serde(rename = "wait_timeout_ms", deserialize_with = "millis")]
    wait_timeout: Duration,
    #[serde(rename = "poll_interval_ms", deserialize_with = "nonzero_millis")]
    poll_interval: Duration,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credentials: None,
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl EtaConfig {
    /// Loads the configuration from `ETA_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }

        config.credentials = match (lookup(ENV_API_KEY), lookup(ENV_API_SECRET)) {
            (Some(key), Some(secret)) => Some(Credentials::new(key, secret)),
            (None, None) => None,
            _ => {
                return Err(ConfigError::PartialCredentials {
                    key_var: ENV_API_KEY,
                    secret_var: ENV_API_SECRET,
                })
            }
        };

        if let Some(value) = lookup(ENV_WAIT_TIMEOUT_MS) {
            config.wait_timeout = Duration::from_millis(parse_millis(ENV_WAIT_TIMEOUT_MS, value)?);
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            let millis = parse_millis(ENV_POLL_INTERVAL_MS, value.clone())?;
            if millis == 0 {
                return Err(ConfigError::InvalidValue {
                    var: ENV_POLL_INTERVAL_MS,
                    value,
                    reason: "poll interval must be positive".to_string(),
                });
            }
            config.poll_interval = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Sets the pause between empty polls. Raised to [`MIN_POLL_INTERVAL`]
    /// if smaller, so a poll loop always advances through its budget.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn nonzero_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    match u64::deserialize(deserializer)? {
        0 => Err(de::Error::custom("poll_interval_ms must be positive")),
        ms => Ok(Duration::from_millis(ms)),
    }
}

fn parse_millis(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        })
}
