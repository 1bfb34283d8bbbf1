//! Client configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Public HCP Terraform API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://app.terraform.io/api/v2";

/// Request budget for the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window
    pub max_requests: usize,
    /// Window length
    #[serde(with = "duration_ms")]
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(1),
        }
    }
}

/// Everything needed to construct a [`TerraformClient`](crate::TerraformClient).
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API token sent as a bearer token; never serialized
    #[serde(default, skip_serializing)]
    pub api_token: String,
    /// Organization name
    pub organization: String,
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// Wall-clock timeout per HTTP call
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    /// Outbound request budget
    pub rate_limit: RateLimit,
    /// Cache GET responses
    pub enable_caching: bool,
    /// How long cached responses stay fresh
    #[serde(with = "duration_ms")]
    pub cache_ttl: Duration,
    /// Verbose logging
    pub debug: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &redact(&self.api_token))
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .field("enable_caching", &self.enable_caching)
            .field("cache_ttl", &self.cache_ttl)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything but the credentials.
    pub fn new(api_token: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            organization: organization.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit: RateLimit::default(),
            enable_caching: false,
            cache_ttl: Duration::from_secs(60),
            debug: false,
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the rate limit.
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Enable or disable the read cache.
    pub fn with_caching(mut self, enable: bool) -> Self {
        self.enable_caching = enable;
        self
    }

    /// Enable or disable debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject configurations that cannot produce a working client.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api_token.trim().is_empty() {
            return Err(ClientError::validation("API token must be set"));
        }
        if self.organization.trim().is_empty() {
            return Err(ClientError::validation("organization must be set"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ClientError::validation(format!(
                "base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// A view of the configuration that is safe to log.
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            organization: self.organization.clone(),
            base_url: self.base_url.clone(),
            api_token_set: !self.api_token.is_empty(),
            api_token_length: self.api_token.len(),
            enable_caching: self.enable_caching,
            debug: self.debug,
        }
    }
}

/// Loggable configuration summary without secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSummary {
    /// Organization name
    pub organization: String,
    /// API base URL
    pub base_url: String,
    /// Whether a token is configured
    pub api_token_set: bool,
    /// Length of the configured token
    pub api_token_length: usize,
    /// Read cache enabled
    pub enable_caching: bool,
    /// Debug logging enabled
    pub debug: bool,
}

fn redact(token: &str) -> String {
    if token.len() > 8 && token.is_char_boundary(4) && token.is_char_boundary(token.len() - 4) {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "****".to_string()
    }
}

/// Helper for serializing Duration as milliseconds
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("token", "acme");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit, RateLimit::default());
        assert!(!config.enable_caching);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("t", "acme").with_base_url("http://localhost:8080/api/v2/");
        assert_eq!(config.base_url, "http://localhost:8080/api/v2");
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        assert!(ClientConfig::new("", "acme").validate().is_err());
        assert!(ClientConfig::new("token", " ").validate().is_err());
        assert!(
            ClientConfig::new("token", "acme")
                .with_base_url("ftp://example.com")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_debug_never_prints_token() {
        let config = ClientConfig::new("abcd-secret-token-wxyz", "acme");
        let printed = format!("{:?}", config);

        assert!(!printed.contains("secret"));
        assert!(printed.contains("abcd...wxyz"));

        let short = format!("{:?}", ClientConfig::new("short", "acme"));
        assert!(short.contains("****"));
    }

    #[test]
    fn test_summary() {
        let summary = ClientConfig::new("12345", "acme").with_caching(true).summary();

        assert_eq!(summary.organization, "acme");
        assert!(summary.api_token_set);
        assert_eq!(summary.api_token_length, 5);
        assert!(summary.enable_caching);
    }

    #[test]
    fn test_serialization_format() {
        let config = ClientConfig::new("t", "acme").with_timeout(Duration::from_millis(5000));
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"timeout\":5000"));
        assert!(json.contains("\"window\":1000"));

        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_serialization_omits_token() {
        let config = ClientConfig::new("abcd-secret-token-wxyz", "acme");
        let value = serde_json::to_value(&config).unwrap();

        assert!(value.get("api_token").is_none());
        assert!(!value.to_string().contains("secret"));
        assert_eq!(value["organization"], "acme");

        let with_token: ClientConfig = serde_json::from_value(serde_json::json!({
            "api_token": "t0k3n",
            "organization": "acme",
            "base_url": DEFAULT_BASE_URL,
            "timeout": 1000,
            "rate_limit": {"max_requests": 30, "window": 1000},
            "enable_caching": false,
            "cache_ttl": 60000,
            "debug": false
        }))
        .unwrap();
        assert_eq!(with_token.api_token, "t0k3n");
    }
}
