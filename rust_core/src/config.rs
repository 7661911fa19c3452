//! Subject configuration and environment helpers.
//!
//! Every service tracks the same subject player; the id, team and display
//! name come from the environment so nothing player-specific is baked into
//! library code.

use std::env;
use std::time::Duration;

/// Default subject player id (NHL api-web id).
pub const DEFAULT_SUBJECT_PLAYER_ID: i64 = 8471214;

/// Default subject team abbrev.
pub const DEFAULT_SUBJECT_TEAM: &str = "WSH";

/// Default subject display name, used in notifications and odds matching.
pub const DEFAULT_SUBJECT_NAME: &str = "Alex Ovechkin";

/// Default Redis URL when REDIS_URL is unset.
pub const DEFAULT_REDIS_URL: &str = "redis://redis:6379";

/// The tracked player and team.
#[derive(Debug, Clone)]
pub struct SubjectConfig {
    pub player_id: i64,
    pub team_abbrev: String,
    pub player_name: String,
}

impl SubjectConfig {
    /// Load from SUBJECT_PLAYER_ID / SUBJECT_TEAM / SUBJECT_NAME with defaults.
    pub fn from_env() -> Self {
        Self {
            player_id: env::var("SUBJECT_PLAYER_ID")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(DEFAULT_SUBJECT_PLAYER_ID),
            team_abbrev: env::var("SUBJECT_TEAM")
                .unwrap_or_else(|_| DEFAULT_SUBJECT_TEAM.to_string()),
            player_name: env::var("SUBJECT_NAME")
                .unwrap_or_else(|_| DEFAULT_SUBJECT_NAME.to_string()),
        }
    }

    /// Last name used for matching the subject in odds-market descriptions.
    pub fn last_name(&self) -> &str {
        self.player_name
            .rsplit(' ')
            .next()
            .unwrap_or(&self.player_name)
    }
}

/// Load Redis URL from environment or use default.
pub fn redis_url() -> String {
    env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string())
}

/// Read a duration env var given in seconds, with a default.
pub fn duration_secs_env(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_last_name() {
        let s = SubjectConfig {
            player_id: 1,
            team_abbrev: "WSH".into(),
            player_name: "Alex Ovechkin".into(),
        };
        assert_eq!(s.last_name(), "Ovechkin");

        let single = SubjectConfig {
            player_id: 1,
            team_abbrev: "WSH".into(),
            player_name: "Ovechkin".into(),
        };
        assert_eq!(single.last_name(), "Ovechkin");
    }
}
