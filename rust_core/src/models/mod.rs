// Shared models for goalbot services
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod teams;

// ============================================================================
// Deserialization helpers
// ============================================================================

pub mod de {
    use serde::{Deserialize, Deserializer};

    /// NHL api-web serves some name fields either as a bare string or as a
    /// localized object `{"default": "..."}`; accept both.
    pub fn string_or_localized<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Localized { default: String },
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(s) => s,
            Raw::Localized { default } => default,
        })
    }
}

// ============================================================================
// Redis keys, streams and TTLs (cross-service contract)
// ============================================================================

pub mod keys {
    /// Merged subject game log written by the collector (JSON array).
    pub const GAME_LOG: &str = "goalbot:game_log";
    /// League standings map written by the collector (JSON map, abbrev -> team).
    pub const STANDINGS: &str = "standings:now";
    /// Latest next-game prediction written by the predictor.
    pub const NEXT_PREDICTION: &str = "goalbot:next_prediction";
    /// Calibration samples appended by the evaluator (list, newest first).
    pub const CALIBRATION_LOG: &str = "goalbot:calibration:log";
    /// Most recent game id the evaluator has reported on.
    pub const EVALUATOR_LAST_REPORTED: &str = "goalbot:evaluator:last_reported_game";

    /// Goal events stream (ingestor -> announcer).
    pub const GOALS_STREAM: &str = "goalbot:goals";
    /// Pre-game reminder stream (predictor -> announcer).
    pub const REMINDERS_STREAM: &str = "goalbot:reminders";
    /// Post-game summary stream (evaluator -> announcer).
    pub const POST_GAME_STREAM: &str = "goalbot:post_game";

    pub fn prediction_snapshot(game_id: i64) -> String {
        format!("goalbot:prediction_snapshot:{game_id}")
    }

    pub fn odds(game_id: i64) -> String {
        format!("goalbot:odds:{game_id}")
    }

    pub fn seen_goals(game_id: i64) -> String {
        format!("goalbot:seen_goals:{game_id}")
    }

    pub fn reminder_sent(game_id: i64) -> String {
        format!("goalbot:reminder_sent:{game_id}")
    }
}

pub mod ttl {
    pub const GAME_LOG_SECS: u64 = 12 * 3600;
    pub const STANDINGS_SECS: u64 = 3600;
    pub const NEXT_PREDICTION_SECS: u64 = 3600;
    pub const PREDICTION_SNAPSHOT_SECS: u64 = 7 * 24 * 3600;
    pub const ODDS_SECS: u64 = 12 * 3600;
    pub const SEEN_GOALS_SECS: u64 = 7 * 24 * 3600;
    /// A hair over a day so a rescheduled game cannot double-remind.
    pub const REMINDER_SENT_SECS: u64 = 25 * 3600;
    pub const LAST_REPORTED_SECS: u64 = 30 * 24 * 3600;
    /// Calibration list is trimmed to this many newest samples.
    pub const CALIBRATION_KEEP: usize = 100;
}

// ============================================================================
// Game lifecycle states (NHL api-web `gameState` values)
// ============================================================================

/// Game is on now or about to start.
pub fn is_in_progress_state(state: &str) -> bool {
    matches!(state, "LIVE" | "PRE" | "CRIT")
}

/// Game has finished.
pub fn is_completed_state(state: &str) -> bool {
    matches!(state, "FINAL" | "OFF")
}

/// Game has not started.
pub fn is_future_state(state: &str) -> bool {
    state == "FUT"
}

// ============================================================================
// Schedule
// ============================================================================

/// One game from the club season schedule. Re-fetched every cycle; never
/// mutated after parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub game_id: i64,
    pub home_abbrev: String,
    pub away_abbrev: String,
    pub start_time_utc: DateTime<Utc>,
    pub game_state: String,
    /// Venue-local date, YYYY-MM-DD.
    pub game_date: String,
    pub venue: String,
}

impl Game {
    /// Abbrev of the non-subject team.
    pub fn opponent(&self, subject_team: &str) -> &str {
        if self.home_abbrev == subject_team {
            &self.away_abbrev
        } else {
            &self.home_abbrev
        }
    }

    pub fn is_home(&self, subject_team: &str) -> bool {
        self.home_abbrev == subject_team
    }
}

// ============================================================================
// Cache entries (collector -> predictor/evaluator)
// ============================================================================

/// One historical game for the subject. Chronological oldest-first in the
/// cached log; append-only across seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogEntry {
    #[serde(rename = "gameId")]
    pub game_id: i64,
    /// YYYY-MM-DD.
    #[serde(rename = "gameDate")]
    pub game_date: String,
    #[serde(rename = "opponentAbbrev")]
    pub opponent_abbrev: String,
    /// "H" or "R".
    #[serde(rename = "homeRoadFlag")]
    pub home_road_flag: String,
    pub goals: i32,
}

impl GameLogEntry {
    pub fn is_home(&self) -> bool {
        self.home_road_flag == "H"
    }
}

/// Per-team standings aggregate. Refreshed wholesale each collector cycle.
/// Home/road splits feed the venue-specific opponent factor; L10 splits feed
/// recent defensive form and pace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandingsTeam {
    #[serde(rename = "teamAbbrev", deserialize_with = "de::string_or_localized", default)]
    pub team_abbrev: String,
    #[serde(rename = "gamesPlayed", default)]
    pub games_played: i32,
    #[serde(rename = "goalAgainst", default)]
    pub goal_against: i32,
    #[serde(rename = "goalFor", default)]
    pub goal_for: i32,
    /// Points percentage on a 0-1 scale; 0.0 means unavailable.
    #[serde(rename = "pointPctg", default)]
    pub point_pctg: f64,
    #[serde(rename = "l10GamesPlayed", default)]
    pub l10_games_played: i32,
    #[serde(rename = "l10GoalsAgainst", default)]
    pub l10_goals_against: i32,
    #[serde(rename = "l10GoalsFor", default)]
    pub l10_goals_for: i32,
    #[serde(rename = "homeGamesPlayed", default)]
    pub home_games_played: i32,
    #[serde(rename = "homeGoalsAgainst", default)]
    pub home_goals_against: i32,
    #[serde(rename = "roadGamesPlayed", default)]
    pub road_games_played: i32,
    #[serde(rename = "roadGoalsAgainst", default)]
    pub road_goals_against: i32,
}

// ============================================================================
// Goalie resolution
// ============================================================================

/// Opposing starter's display name and season save percentage (0-1).
/// `save_pct == 0.0` means unknown, not zero saves; the goalie factor must
/// stay neutral in that case. Never persisted beyond the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalieInfo {
    pub name: String,
    pub save_pct: f64,
}

// ============================================================================
// Stream payloads
// ============================================================================

/// Emitted on the goals stream when the subject's goal count increases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalEvent {
    pub player_id: i64,
    /// Career regular-season total including this goal.
    pub goals: i32,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_name: Option<String>,
    /// Goalie in net at the moment of the goal, when play-by-play had it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goalie_name: Option<String>,
}

/// Prediction for one upcoming game. Written to the next-prediction key and
/// the per-game snapshot, and carried verbatim on the reminders stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub game_id: i64,
    pub opponent: String,
    /// "HOME" or "AWAY" from the subject's perspective.
    pub home_away: String,
    /// Bounded to [15, 75] at every stage of blending.
    pub probability_pct: i32,
    /// RFC 3339.
    pub start_time_utc: String,
    pub game_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds_american: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goalie_name: Option<String>,
}

impl PredictionPayload {
    pub fn new(game: &Game, subject_team: &str, probability_pct: i32) -> Self {
        Self {
            game_id: game.game_id,
            opponent: game.opponent(subject_team).to_string(),
            home_away: if game.is_home(subject_team) { "HOME" } else { "AWAY" }.to_string(),
            probability_pct,
            start_time_utc: game.start_time_utc.to_rfc3339(),
            game_date: game.game_date.clone(),
            odds_american: None,
            goalie_name: None,
        }
    }
}

/// Free-text post-game summary for the announcer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostGamePayload {
    pub message: String,
}

/// One evaluated game: what we predicted and whether the subject scored.
/// `scored` is 0/1 so the calibration reader can sum it directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub pred_pct: i32,
    pub scored: i32,
}
