//! Collector configuration.

use std::env;
use std::time::Duration;

use goalbot_core::config::duration_secs_env;

/// Default time between aggregation runs.
pub const DEFAULT_COLLECT_INTERVAL: Duration = Duration::from_secs(6 * 3600);

/// Deadline for one full aggregation run.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(120);

/// Seasons fetched for the subject game log, startYear+endYear format.
pub const DEFAULT_SEASONS: &str = "20232024,20242025,20252026";

#[derive(Debug, Clone)]
pub struct Config {
    pub collect_interval: Duration,
    pub seasons: Vec<String>,
}

impl Config {
    /// Load from COLLECTOR_INTERVAL_SECS / GAME_LOG_SEASONS with defaults.
    pub fn from_env() -> Self {
        let seasons = env::var("GAME_LOG_SEASONS")
            .unwrap_or_else(|_| DEFAULT_SEASONS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            collect_interval: duration_secs_env("COLLECTOR_INTERVAL_SECS", DEFAULT_COLLECT_INTERVAL),
            seasons,
        }
    }
}
