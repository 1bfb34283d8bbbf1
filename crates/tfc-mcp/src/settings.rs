//! Command-line and environment configuration shared by the binaries.

use std::time::Duration;

use clap::Args;
use clap::builder::BoolishValueParser;
use tfc::{ClientConfig, DEFAULT_BASE_URL, RateLimit};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How to reach the HCP Terraform API.
#[derive(Args, Clone)]
pub struct ConnectionArgs {
    /// API token used as the bearer credential
    #[arg(long, env = "TFC_API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Organization every operation is scoped to
    #[arg(long, env = "TFC_ORGANIZATION")]
    pub organization: String,

    /// API base URL
    #[arg(long, env = "TFC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "TFC_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Maximum requests per rate-limit window
    #[arg(long, env = "TFC_RATE_LIMIT", default_value_t = 30)]
    pub rate_limit: usize,

    /// Rate-limit window in milliseconds
    #[arg(long, env = "TFC_RATE_LIMIT_WINDOW_MS", default_value_t = 1000)]
    pub rate_limit_window_ms: u64,

    /// Cache read-only responses
    #[arg(
        long,
        env = "TFC_ENABLE_CACHING",
        value_parser = BoolishValueParser::new(),
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub enable_caching: bool,

    /// Verbose logging
    #[arg(
        long,
        env = "TFC_DEBUG_MODE",
        value_parser = BoolishValueParser::new(),
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub debug: bool,
}

impl std::fmt::Debug for ConnectionArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionArgs")
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl ConnectionArgs {
    /// Build the client configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_token.clone(), self.organization.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_rate_limit(RateLimit {
                max_requests: self.rate_limit,
                window: Duration::from_millis(self.rate_limit_window_ms),
            })
            .with_caching(self.enable_caching)
            .with_debug(self.debug)
    }
}

/// Install a stderr subscriber; stdout belongs to the stdio transport.
///
/// `debug` raises the library targets to `debug` on top of `RUST_LOG`.
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    if debug {
        filter = filter
            .add_directive("tfc=debug".parse()?)
            .add_directive("tfc_mcp=debug".parse()?);
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        connection: ConnectionArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tfc", "--api-token", "t0k3n", "--organization", "acme"])
            .unwrap();
        let config = cli.connection.client_config();

        assert_eq!(config.organization, "acme");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit, RateLimit::default());
        assert!(!config.enable_caching);
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "tfc",
            "--api-token",
            "t0k3n",
            "--organization",
            "acme",
            "--base-url",
            "http://localhost:8080/api/v2/",
            "--rate-limit",
            "5",
            "--enable-caching",
            "--debug",
            "yes",
        ])
        .unwrap();
        let config = cli.connection.client_config();

        assert_eq!(config.base_url, "http://localhost:8080/api/v2");
        assert_eq!(config.rate_limit.max_requests, 5);
        assert!(config.enable_caching);
        assert!(config.debug);
    }

    #[test]
    fn test_debug_output_hides_token() {
        let cli = Cli::try_parse_from(["tfc", "--api-token", "secret-token", "--organization", "acme"])
            .unwrap();
        assert!(!format!("{:?}", cli.connection).contains("secret-token"));
    }
}
