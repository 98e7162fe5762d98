//! Helpers shared across command handlers.

use backlog::{WorkItemProvider, WorkItemsClient};
use chrono::{DateTime, Utc};

use crate::config::Config;

/// Build a provider from the loaded configuration.
pub(crate) fn build_provider(
    config: &Config,
) -> Result<WorkItemProvider, Box<dyn std::error::Error>> {
    let client_config = config.client_config()?;
    let client = WorkItemsClient::new(client_config)?;
    Ok(WorkItemProvider::new(client))
}

/// Format an optional timestamp for display, "-" when absent.
pub(crate) fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_render_in_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp(Some(ts)), "2024-03-15 09:30:00 UTC");
    }

    #[test]
    fn missing_timestamps_render_as_dash() {
        assert_eq!(format_timestamp(None), "-");
    }
}
