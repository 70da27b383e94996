use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

/// Public endpoint of the service in the `us-south` region
pub const DEFAULT_SERVICE_URL: &str = "https://api.us-south.text-to-speech.watson.cloud.ibm.com";

/// Retries attempted when none are configured
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Backoff ceiling when none is configured
pub const DEFAULT_MAX_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Endpoint and transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL, including any instance path prefix
    #[serde(default = "default_url")]
    pub url: String,
    /// Accept invalid TLS certificates
    #[serde(default)]
    pub disable_ssl_verification: bool,
    /// Gzip request bodies
    #[serde(default)]
    pub enable_gzip: bool,
    /// Request timeout (e.g. "60s")
    #[serde(default)]
    pub timeout: Option<String>,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Automatic retries; disabled when absent
    #[serde(default)]
    pub retries: Option<RetryConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            disable_ssl_verification: false,
            enable_gzip: false,
            timeout: None,
            headers: IndexMap::new(),
            retries: None,
        }
    }
}

impl ServiceConfig {
    /// Parsed request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout string is not a valid duration
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout.as_deref().map(|s| parse_duration("service.timeout", s)).transpose()
    }
}

/// Retry policy for transient failures
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum retries after the first attempt; 0 selects the default
    #[serde(default)]
    pub max_retries: u32,
    /// Upper bound on the delay between attempts (e.g. "20s"); unset selects the default
    #[serde(default)]
    pub max_retry_interval: Option<String>,
}

impl RetryConfig {
    /// Maximum retries, with 0 replaced by [`DEFAULT_MAX_RETRIES`]
    pub const fn max_retries(&self) -> u32 {
        if self.max_retries == 0 {
            DEFAULT_MAX_RETRIES
        } else {
            self.max_retries
        }
    }

    /// Backoff ceiling, with unset or zero replaced by [`DEFAULT_MAX_RETRY_INTERVAL`]
    ///
    /// # Errors
    ///
    /// Returns an error if the interval string is not a valid duration
    pub fn max_retry_interval(&self) -> anyhow::Result<Duration> {
        let interval = match self.max_retry_interval.as_deref() {
            Some(s) => parse_duration("service.retries.max_retry_interval", s)?,
            None => Duration::ZERO,
        };

        Ok(if interval.is_zero() {
            DEFAULT_MAX_RETRY_INTERVAL
        } else {
            interval
        })
    }
}

fn default_url() -> String {
    DEFAULT_SERVICE_URL.to_owned()
}

pub(crate) fn parse_duration(field: &str, s: &str) -> anyhow::Result<Duration> {
    duration_str::parse(s).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();

        assert_eq!(config.url, DEFAULT_SERVICE_URL);
        assert!(!config.enable_gzip);
        assert!(config.retries.is_none());
        assert_eq!(config.timeout().unwrap(), None);
    }

    #[test]
    fn retry_defaults_replace_zero() {
        let retries: RetryConfig = toml::from_str("max_retries = 0").unwrap();

        assert_eq!(retries.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(retries.max_retry_interval().unwrap(), DEFAULT_MAX_RETRY_INTERVAL);
    }

    #[test]
    fn durations_are_parsed() {
        let config: ServiceConfig = toml::from_str(
            r#"
            timeout = "90s"

            [retries]
            max_retries = 2
            max_retry_interval = "45s"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(90)));
        let retries = config.retries.unwrap();
        assert_eq!(retries.max_retries(), 2);
        assert_eq!(retries.max_retry_interval().unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn invalid_duration_is_reported() {
        let config: ServiceConfig = toml::from_str(r#"timeout = "soon""#).unwrap();
        let err = config.timeout().unwrap_err();
        assert!(err.to_string().contains("service.timeout"));
    }
}
