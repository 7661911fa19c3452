//! Ingestor configuration.

use std::time::Duration;

use goalbot_core::config::duration_secs_env;

/// Default live-scoreboard poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Deadline for one poll tick including enrichment calls.
pub const TICK_TIMEOUT: Duration = Duration::from_secs(90);

/// Wait before the single play-by-play retry when the feed lags the score.
pub const PBP_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            poll_interval: duration_secs_env("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL),
        }
    }
}
