//! Configuration file support for backlog.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `BACKLOG_`, e.g., `BACKLOG_SERVICE_TOKEN`)
//! 2. Local config file (./backlog.toml)
//! 3. XDG config file (~/.config/backlog/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [service]
//! organization = "acme"
//! project = "web"
//! token = "..."                # or use BACKLOG_SERVICE_TOKEN env var
//! host = "dev.azure.com"       # optional, this is the default
//!
//! [limits]
//! concurrency = 10
//! rps = 10
//! respect_headers = true
//!
//! [retry]
//! attempts = 3
//! base_delay_ms = 500
//! backoff_factor = 2.0
//!
//! [http]
//! timeout_seconds = 30
//! ```

use std::path::PathBuf;
use std::time::Duration;

use backlog::{ClientConfig, Connection, RateLimitOptions, RetryPolicy};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service connection settings.
    pub service: ServiceConfig,
    /// Rate limiter tuning.
    pub limits: LimitsConfig,
    /// Retry policy for transport failures.
    pub retry: RetryConfig,
    /// HTTP transport settings.
    pub http: HttpConfig,
}

/// Service connection settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Organization name.
    /// Can also be set via BACKLOG_SERVICE_ORGANIZATION.
    pub organization: Option<String>,
    /// Project name.
    /// Can also be set via BACKLOG_SERVICE_PROJECT.
    pub project: Option<String>,
    /// Personal access token.
    /// Can also be set via BACKLOG_SERVICE_TOKEN.
    pub token: Option<String>,
    /// Service host, bare or scheme-qualified (default: dev.azure.com).
    /// Can also be set via BACKLOG_SERVICE_HOST.
    pub host: Option<String>,
    /// API version sent with every request.
    pub version: Option<String>,
}

/// Rate limiter tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum simultaneously in-flight requests.
    pub concurrency: usize,
    /// Long-run request dispatch ceiling per second.
    pub rps: u32,
    /// Whether server quota headers may throttle new calls.
    pub respect_headers: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let options = RateLimitOptions::default();
        Self {
            concurrency: options.max_concurrent,
            rps: options.requests_per_second,
            respect_headers: options.respect_headers,
        }
    }
}

/// Retry policy for transport failures.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry attempts after the initial call (0 disables retries).
    pub attempts: usize,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            backoff_factor: policy.backoff_factor,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/backlog/config.toml)
    /// 3. Local config file (./backlog.toml)
    /// 4. Environment variables with BACKLOG_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        // Add XDG config file if it exists
        if let Some(proj_dirs) = ProjectDirs::from("", "", "backlog") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Add local config file (higher priority than XDG)
        let local_config = PathBuf::from("backlog.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./backlog.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Add BACKLOG_ prefixed environment variables
        // e.g., BACKLOG_SERVICE_TOKEN -> service.token
        builder = builder.add_source(
            Environment::with_prefix("BACKLOG")
                .separator("_")
                .try_parsing(true),
        );

        // Build the config and deserialize
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Build the library client configuration from the loaded settings.
    ///
    /// Fails when the connection trio (organization, project, token) is
    /// incomplete.
    pub fn client_config(&self) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let organization = self.service.organization.as_deref().ok_or(
            "No organization configured. Set [service] organization in backlog.toml or BACKLOG_SERVICE_ORGANIZATION.",
        )?;
        let project = self.service.project.as_deref().ok_or(
            "No project configured. Set [service] project in backlog.toml or BACKLOG_SERVICE_PROJECT.",
        )?;
        let token = self.service.token.as_deref().ok_or(
            "No access token configured. Set [service] token in backlog.toml or BACKLOG_SERVICE_TOKEN.",
        )?;

        let mut connection = Connection::new(organization, project, token)?;
        if let Some(host) = &self.service.host {
            connection = connection.with_host(host);
        }
        if let Some(version) = &self.service.version {
            connection = connection.with_api_version(version);
        }

        let mut config = ClientConfig::new(connection);
        config.rate_limit = RateLimitOptions {
            max_concurrent: self.limits.concurrency,
            requests_per_second: self.limits.rps,
            respect_headers: self.limits.respect_headers,
        };
        config.retry = RetryPolicy::new(
            self.retry.attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            self.retry.backoff_factor,
        );
        config.timeout = Duration::from_secs(self.http.timeout_seconds);
        Ok(config)
    }

    /// Get the default config file path.
    #[allow(dead_code)]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "backlog").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
