//! Rate limit inspection command handler.

use clap::ValueEnum;

use backlog::RateLimitStatus;

use crate::commands::shared;
use crate::config::Config;

/// WIQL probe that matches nothing but still draws quota headers.
const PROBE_QUERY: &str = "SELECT [System.Id] FROM WorkItems WHERE [System.Id] = 0";

/// Output format for commands with structured output.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Handle the limits command.
pub(crate) async fn handle_limits(
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = shared::build_provider(config)?;

    // The server only reports quota on responses, so issue one cheap
    // query before reading the limiter's view.
    provider.client().query_work_items(PROBE_QUERY).await?;

    let display = LimitsDisplay::from_status(&provider.rate_limit_status());
    display.print(output);
    Ok(())
}

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct LimitsDisplay {
    #[tabled(rename = "Max Concurrent")]
    pub max_concurrent: usize,
    #[tabled(rename = "Requests/s")]
    pub requests_per_second: u32,
    #[tabled(rename = "Server Quota")]
    pub server_quota: String,
    #[tabled(rename = "Resets At")]
    pub resets_at: String,
    #[tabled(rename = "Throttling")]
    pub throttling: String,
}

impl LimitsDisplay {
    pub(crate) fn from_status(status: &RateLimitStatus) -> Self {
        let (server_quota, resets_at) = match &status.server {
            Some(quota) => {
                let mut summary = format!("{:.0}/{:.0} remaining", quota.remaining, quota.limit);
                if !quota.resource.is_empty() {
                    summary.push_str(&format!(" ({})", quota.resource));
                }
                (summary, format_reset(quota.reset_epoch_seconds))
            }
            None => ("none reported".to_string(), "-".to_string()),
        };
        let throttling = if status.is_throttling {
            format!("yes (~{}s wait)", status.estimated_wait.as_secs())
        } else {
            "no".to_string()
        };

        Self {
            max_concurrent: status.max_concurrent,
            requests_per_second: status.requests_per_second,
            server_quota,
            resets_at,
            throttling,
        }
    }

    pub(crate) fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(vec![self.clone()]);
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap());
            }
        }
    }
}

/// Format a quota reset epoch as a UTC timestamp, "-" when unusable.
fn format_reset(epoch_seconds: f64) -> String {
    if !epoch_seconds.is_finite() {
        return "-".to_string();
    }
    match chrono::DateTime::from_timestamp(epoch_seconds as i64, 0) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use backlog::ServerQuota;

    fn status_without_quota() -> RateLimitStatus {
        RateLimitStatus {
            max_concurrent: 10,
            requests_per_second: 10,
            server: None,
            is_throttling: false,
            estimated_wait: Duration::ZERO,
        }
    }

    #[test]
    fn output_format_default_is_table() {
        assert!(matches!(OutputFormat::default(), OutputFormat::Table));
    }

    #[test]
    fn display_without_server_quota_reports_none() {
        let display = LimitsDisplay::from_status(&status_without_quota());

        assert_eq!(display.max_concurrent, 10);
        assert_eq!(display.requests_per_second, 10);
        assert_eq!(display.server_quota, "none reported");
        assert_eq!(display.resets_at, "-");
        assert_eq!(display.throttling, "no");
    }

    #[test]
    fn display_with_server_quota_summarizes_it() {
        let status = RateLimitStatus {
            server: Some(ServerQuota {
                limit: 200.0,
                remaining: 150.0,
                reset_epoch_seconds: 1_767_225_600.0,
                resource: "WorkItemTracking".to_string(),
            }),
            ..status_without_quota()
        };

        let display = LimitsDisplay::from_status(&status);

        assert_eq!(display.server_quota, "150/200 remaining (WorkItemTracking)");
        assert_eq!(display.resets_at, "2026-01-01 00:00:00 UTC");
    }

    #[test]
    fn display_with_anonymous_quota_omits_the_resource() {
        let status = RateLimitStatus {
            server: Some(ServerQuota {
                limit: 200.0,
                remaining: 12.0,
                reset_epoch_seconds: 1_767_225_600.0,
                resource: String::new(),
            }),
            ..status_without_quota()
        };

        let display = LimitsDisplay::from_status(&status);
        assert_eq!(display.server_quota, "12/200 remaining");
    }

    #[test]
    fn throttling_shows_the_estimated_wait() {
        let status = RateLimitStatus {
            is_throttling: true,
            estimated_wait: Duration::from_secs(42),
            ..status_without_quota()
        };

        let display = LimitsDisplay::from_status(&status);
        assert_eq!(display.throttling, "yes (~42s wait)");
    }

    #[test]
    fn format_reset_rejects_unusable_epochs() {
        assert_eq!(format_reset(f64::NAN), "-");
        assert_eq!(format_reset(f64::INFINITY), "-");
    }

    #[test]
    fn limits_display_print_supports_json_and_table() {
        let display = LimitsDisplay::from_status(&status_without_quota());

        // Smoke tests: this should not panic in either output mode.
        display.print(OutputFormat::Json);
        display.print(OutputFormat::Table);
    }
}
