//! Predictor configuration.

use std::env;
use std::time::Duration;

use goalbot_core::config::duration_secs_env;

/// Default time between prediction cycles.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(600);

/// Deadline for one cycle; sized so the one-minute game-log retry fits.
pub const TICK_TIMEOUT: Duration = Duration::from_secs(120);

/// Wait before the single game-log re-read when the cache is empty (the
/// collector may still be filling it at startup).
pub const GAME_LOG_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Only call the odds API when the game is inside this window; the monthly
/// credit budget does not survive polling a game that is days away.
pub const ODDS_FETCH_WINDOW_HOURS: i64 = 36;

/// Reminder fires when the game starts within [55, 65] minutes.
pub const REMINDER_WINDOW_START_MINS: i64 = 55;
pub const REMINDER_WINDOW_END_MINS: i64 = 65;

#[derive(Debug, Clone)]
pub struct Config {
    pub check_interval: Duration,
    /// Empty disables odds fetching entirely.
    pub odds_api_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            check_interval: duration_secs_env("CHECK_INTERVAL_SECS", DEFAULT_CHECK_INTERVAL),
            odds_api_key: env::var("ODDS_API_KEY").unwrap_or_default(),
        }
    }
}
