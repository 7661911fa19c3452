//! Pre-game reminder publication.
//!
//! Exactly one reminder per game: the window check keeps the 10-minute tick
//! from firing early or late, and the sent marker (with a TTL outliving the
//! game day) makes retries and restarts idempotent.

use anyhow::Result;
use chrono::Duration;

use goalbot_core::models::{keys, PredictionPayload};
use goalbot_core::redis::{cache, RedisBus};

use crate::config::{REMINDER_WINDOW_END_MINS, REMINDER_WINDOW_START_MINS};

/// True when the time until puck drop falls inside the reminder window.
pub fn in_reminder_window(until_start: Duration) -> bool {
    until_start >= Duration::minutes(REMINDER_WINDOW_START_MINS)
        && until_start <= Duration::minutes(REMINDER_WINDOW_END_MINS)
}

/// Queue the reminder and mark the game as sent. The marker is written only
/// after a successful append, so a failed append retries next tick while a
/// duplicate append is absorbed by the marker check upstream.
pub async fn publish(bus: &RedisBus, payload: &PredictionPayload) -> Result<()> {
    bus.emit(keys::REMINDERS_STREAM, payload).await?;
    cache::mark_reminder_sent(bus, payload.game_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(in_reminder_window(Duration::minutes(55)));
        assert!(in_reminder_window(Duration::minutes(60)));
        assert!(in_reminder_window(Duration::minutes(65)));
        assert!(!in_reminder_window(Duration::minutes(54)));
        assert!(!in_reminder_window(Duration::minutes(66)));
        assert!(!in_reminder_window(Duration::minutes(120)));
        assert!(!in_reminder_window(Duration::minutes(-10)));
    }
}
