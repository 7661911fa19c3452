//! NHL api-web client.
//!
//! One shared client for everything the services pull from the free NHL API:
//! per-season player game logs, league standings, the club season schedule,
//! the live scoreboard, game boxscores, play-by-play and team rosters.
//! All endpoints are unauthenticated reads with a per-call timeout.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::de::string_or_localized;
use crate::models::{is_completed_state, is_future_state, is_in_progress_state};
use crate::models::{Game, GameLogEntry, StandingsTeam};

const BASE_URL: &str = "https://api-web.nhle.com/v1";
const GAME_TYPE_REGULAR: i32 = 2;
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum NhlError {
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type NhlResult<T> = Result<T, NhlError>;

#[derive(Clone)]
pub struct NhlClient {
    http: Client,
    base_url: String,
}

impl Default for NhlClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NhlClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .user_agent("goalbot/1.0")
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: BASE_URL.to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, url: &str) -> NhlResult<T> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NhlError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    // ------------------------------------------------------------------
    // Player game log & standings (collector)
    // ------------------------------------------------------------------

    /// Regular-season game log for one season (e.g. "20242025"), oldest first
    /// as served by the API.
    pub async fn game_log(&self, player_id: i64, season_id: &str) -> NhlResult<Vec<GameLogEntry>> {
        let url = format!(
            "{}/player/{}/game-log/{}/{}",
            self.base_url, player_id, season_id, GAME_TYPE_REGULAR
        );
        let out: RawGameLog = self.get_json("game log", &url).await?;
        Ok(out.game_log)
    }

    /// Current standings keyed by team abbrev.
    pub async fn standings_now(&self) -> NhlResult<HashMap<String, StandingsTeam>> {
        let url = format!("{}/standings/now", self.base_url);
        let raw: RawStandings = self.get_json("standings", &url).await?;
        let mut map = HashMap::with_capacity(raw.standings.len());
        for team in raw.standings {
            if team.team_abbrev.is_empty() {
                continue;
            }
            map.insert(team.team_abbrev.clone(), team);
        }
        Ok(map)
    }

    // ------------------------------------------------------------------
    // Club schedule (predictor, evaluator, announcer)
    // ------------------------------------------------------------------

    /// Full season schedule for the team, in schedule order.
    pub async fn club_schedule(&self, team: &str) -> NhlResult<Vec<Game>> {
        let url = format!("{}/club-schedule-season/{}/now", self.base_url, team);
        let raw: RawSchedule = self.get_json("club schedule", &url).await?;
        Ok(raw.games.into_iter().map(RawScheduledGame::into_game).collect())
    }

    /// Next relevant game: an in-progress game wins over the first future one.
    /// None when the schedule is empty or the season is over.
    pub async fn next_game(&self, team: &str) -> NhlResult<Option<Game>> {
        let games = self.club_schedule(team).await?;
        Ok(select_next_game(&games, Utc::now()))
    }

    /// Most recently finished game, or None when none has completed yet.
    pub async fn last_completed_game(&self, team: &str) -> NhlResult<Option<Game>> {
        let games = self.club_schedule(team).await?;
        Ok(select_last_completed(&games, Utc::now()))
    }

    // ------------------------------------------------------------------
    // Live scoreboard (ingestor)
    // ------------------------------------------------------------------

    /// The team's game from the live score window, any state; None when the
    /// team is not in the current window.
    pub async fn score_now_game(&self, team: &str) -> NhlResult<Option<ScoreGame>> {
        let url = format!("{}/score/now", self.base_url);
        let raw: RawScoreNow = self.get_json("score/now", &url).await?;
        Ok(raw
            .games
            .into_iter()
            .find(|g| g.home_team.abbrev == team || g.away_team.abbrev == team)
            .map(|g| ScoreGame {
                game_id: g.id,
                game_state: g.game_state,
                home_abbrev: g.home_team.abbrev,
                away_abbrev: g.away_team.abbrev,
                goals: g
                    .goals
                    .into_iter()
                    .map(|goal| ScoreGoal {
                        player_id: goal.player_id,
                        goals_to_date: goal.goals_to_date,
                    })
                    .collect(),
            }))
    }

    // ------------------------------------------------------------------
    // Player landing (ingestor, predictor, evaluator)
    // ------------------------------------------------------------------

    /// Career regular-season goal total.
    pub async fn career_goals(&self, player_id: i64) -> NhlResult<i32> {
        let url = format!("{}/player/{}/landing", self.base_url, player_id);
        let landing: RawLanding = self.get_json("player landing", &url).await?;
        Ok(landing.career_totals.regular_season.goals)
    }

    /// Season save percentage for a goalie; 0.0 when the API has none.
    /// featuredStats is absent for backups, so fall back to the most recent
    /// regular-season entry in seasonTotals.
    pub async fn player_save_pct(&self, player_id: i64) -> NhlResult<f64> {
        let url = format!("{}/player/{}/landing", self.base_url, player_id);
        let landing: RawLanding = self.get_json("player landing", &url).await?;
        Ok(save_pct_from_landing(&landing))
    }

    // ------------------------------------------------------------------
    // Boxscore (predictor goalie fallback, evaluator, ingestor enrichment)
    // ------------------------------------------------------------------

    /// Game boxscore; Ok(None) when the lineup is not yet published (404).
    pub async fn boxscore(&self, game_id: i64) -> NhlResult<Option<Boxscore>> {
        let url = format!("{}/gamecenter/{}/boxscore", self.base_url, game_id);
        let raw: RawBoxscore = match self.get_json("boxscore", &url).await {
            Ok(raw) => raw,
            Err(NhlError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(raw.into_boxscore()))
    }

    // ------------------------------------------------------------------
    // Play-by-play (ingestor goal enrichment)
    // ------------------------------------------------------------------

    /// Name of the goalie in net for a specific goal, matched by scorer id
    /// and the scorer's running season total. None when the feed does not
    /// have the play yet.
    pub async fn goalie_for_goal(
        &self,
        game_id: i64,
        scorer_id: i64,
        goals_to_date: i32,
    ) -> NhlResult<Option<String>> {
        let url = format!("{}/gamecenter/{}/play-by-play", self.base_url, game_id);
        let raw: RawPlayByPlay = self.get_json("play-by-play", &url).await?;
        Ok(goalie_from_plays(&raw, scorer_id, goals_to_date))
    }

    // ------------------------------------------------------------------
    // Roster (goalie name normalization)
    // ------------------------------------------------------------------

    pub async fn roster_goalies(&self, team: &str) -> NhlResult<Vec<RosterGoalie>> {
        let url = format!("{}/roster/{}/current", self.base_url, team);
        let raw: RawRoster = self.get_json("roster", &url).await?;
        Ok(raw
            .goalies
            .into_iter()
            .map(|g| RosterGoalie {
                id: g.id,
                first_name: g.first_name,
                last_name: g.last_name,
            })
            .collect())
    }
}

// ============================================================================
// Public response types
// ============================================================================

/// One game from the live scoreboard, with per-goal scorer totals.
#[derive(Debug, Clone)]
pub struct ScoreGame {
    pub game_id: i64,
    pub game_state: String,
    pub home_abbrev: String,
    pub away_abbrev: String,
    pub goals: Vec<ScoreGoal>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreGoal {
    pub player_id: i64,
    /// Scorer's season goal count including this goal.
    pub goals_to_date: i32,
}

#[derive(Debug, Clone)]
pub struct Boxscore {
    pub home_abbrev: String,
    pub away_abbrev: String,
    pub home_name: String,
    pub away_name: String,
    pub home_goalies: Vec<BoxscoreGoalie>,
    pub away_goalies: Vec<BoxscoreGoalie>,
    pub home_skaters: Vec<SkaterLine>,
    pub away_skaters: Vec<SkaterLine>,
}

impl Boxscore {
    /// Opponent (abbrev, common name) from the subject team's perspective.
    pub fn opponent_of(&self, team: &str) -> (&str, &str) {
        if self.home_abbrev == team {
            (&self.away_abbrev, &self.away_name)
        } else {
            (&self.home_abbrev, &self.home_name)
        }
    }

    pub fn opposing_goalies(&self, team: &str) -> &[BoxscoreGoalie] {
        if self.home_abbrev == team {
            &self.away_goalies
        } else {
            &self.home_goalies
        }
    }

    /// The opponent's starter; falls back to the first listed goalie when no
    /// starter flag is set yet.
    pub fn opposing_starter(&self, team: &str) -> Option<&BoxscoreGoalie> {
        let goalies = self.opposing_goalies(team);
        goalies.iter().find(|g| g.starter).or_else(|| goalies.first())
    }

    pub fn skater_line(&self, player_id: i64) -> Option<&SkaterLine> {
        self.away_skaters
            .iter()
            .chain(self.home_skaters.iter())
            .find(|s| s.player_id == player_id)
    }
}

#[derive(Debug, Clone)]
pub struct BoxscoreGoalie {
    pub player_id: i64,
    pub name: String,
    pub starter: bool,
}

/// The subject's line for one game.
#[derive(Debug, Clone)]
pub struct SkaterLine {
    pub player_id: i64,
    pub goals: i32,
    pub assists: i32,
    pub points: i32,
    pub toi: String,
    pub shifts: i32,
    pub sog: i32,
}

#[derive(Debug, Clone)]
pub struct RosterGoalie {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

// ============================================================================
// Selection helpers (pure; the schedule is fetched once per tick)
// ============================================================================

/// First in-progress game, else the first future game not already started.
pub fn select_next_game(games: &[Game], now: DateTime<Utc>) -> Option<Game> {
    let mut first_future: Option<&Game> = None;
    for g in games {
        if is_in_progress_state(&g.game_state) {
            return Some(g.clone());
        }
        if is_future_state(&g.game_state) && g.start_time_utc >= now && first_future.is_none() {
            first_future = Some(g);
        }
    }
    first_future.cloned()
}

/// Completed game with the latest start time not after `now`.
pub fn select_last_completed(games: &[Game], now: DateTime<Utc>) -> Option<Game> {
    let mut last: Option<&Game> = None;
    for g in games {
        if !is_completed_state(&g.game_state) || g.start_time_utc > now {
            continue;
        }
        if last.map_or(true, |prev| g.start_time_utc > prev.start_time_utc) {
            last = Some(g);
        }
    }
    last.cloned()
}

fn save_pct_from_landing(landing: &RawLanding) -> f64 {
    if let Some(pct) = landing
        .featured_stats
        .as_ref()
        .and_then(|f| f.regular_season.as_ref())
        .and_then(|r| r.sub_season.as_ref())
        .map(|s| s.save_pctg)
    {
        if pct > 0.0 {
            return pct;
        }
    }
    let mut best_season = 0;
    let mut best_pct = 0.0;
    for s in &landing.season_totals {
        if s.game_type_id != GAME_TYPE_REGULAR {
            continue;
        }
        if s.season > best_season && s.save_pctg > 0.0 {
            best_season = s.season;
            best_pct = s.save_pctg;
        }
    }
    best_pct
}

fn goalie_from_plays(pbp: &RawPlayByPlay, scorer_id: i64, goals_to_date: i32) -> Option<String> {
    let goalie_id = pbp.plays.iter().find_map(|p| {
        if p.type_desc_key != "goal" {
            return None;
        }
        let d = p.details.as_ref()?;
        if d.scoring_player_id == Some(scorer_id) && d.scoring_player_total == Some(goals_to_date) {
            d.goalie_in_net_id
        } else {
            None
        }
    })?;
    pbp.roster_spots
        .iter()
        .find(|r| r.player_id == goalie_id)
        .map(|r| format!("{} {}", r.first_name, r.last_name).trim().to_string())
        .filter(|name| !name.is_empty())
}

// ============================================================================
// Raw response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawGameLog {
    #[serde(rename = "gameLog", default)]
    game_log: Vec<GameLogEntry>,
}

#[derive(Debug, Deserialize)]
struct RawStandings {
    #[serde(default)]
    standings: Vec<StandingsTeam>,
}

#[derive(Debug, Deserialize)]
struct RawSchedule {
    #[serde(default)]
    games: Vec<RawScheduledGame>,
}

#[derive(Debug, Deserialize)]
struct RawScheduledGame {
    id: i64,
    #[serde(rename = "gameDate", default)]
    game_date: String,
    #[serde(rename = "startTimeUTC", default)]
    start_time_utc: String,
    #[serde(rename = "gameState", default)]
    game_state: String,
    #[serde(default, deserialize_with = "de_opt_localized")]
    venue: Option<String>,
    #[serde(rename = "homeTeam", default)]
    home_team: RawTeamRef,
    #[serde(rename = "awayTeam", default)]
    away_team: RawTeamRef,
}

impl RawScheduledGame {
    fn into_game(self) -> Game {
        let start = DateTime::parse_from_rfc3339(&self.start_time_utc)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Game {
            game_id: self.id,
            home_abbrev: self.home_team.abbrev,
            away_abbrev: self.away_team.abbrev,
            start_time_utc: start,
            game_state: self.game_state,
            game_date: self.game_date,
            venue: self.venue.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawTeamRef {
    #[serde(default)]
    abbrev: String,
    #[serde(rename = "commonName", default, deserialize_with = "de_opt_localized")]
    common_name: Option<String>,
}

fn de_opt_localized<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "string_or_localized")] String);
    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|w| w.0))
}

#[derive(Debug, Deserialize)]
struct RawScoreNow {
    #[serde(default)]
    games: Vec<RawScoreGame>,
}

#[derive(Debug, Deserialize)]
struct RawScoreGame {
    id: i64,
    #[serde(rename = "gameState", default)]
    game_state: String,
    #[serde(rename = "homeTeam", default)]
    home_team: RawTeamRef,
    #[serde(rename = "awayTeam", default)]
    away_team: RawTeamRef,
    #[serde(default)]
    goals: Vec<RawScoreGoal>,
}

#[derive(Debug, Deserialize)]
struct RawScoreGoal {
    #[serde(rename = "playerId", default)]
    player_id: i64,
    #[serde(rename = "goalsToDate", default)]
    goals_to_date: i32,
}

#[derive(Debug, Deserialize)]
struct RawLanding {
    #[serde(rename = "careerTotals", default)]
    career_totals: RawCareerTotals,
    #[serde(rename = "featuredStats", default)]
    featured_stats: Option<RawFeaturedStats>,
    #[serde(rename = "seasonTotals", default)]
    season_totals: Vec<RawSeasonTotal>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCareerTotals {
    #[serde(rename = "regularSeason", default)]
    regular_season: RawCareerRegularSeason,
}

#[derive(Debug, Default, Deserialize)]
struct RawCareerRegularSeason {
    #[serde(default)]
    goals: i32,
}

#[derive(Debug, Deserialize)]
struct RawFeaturedStats {
    #[serde(rename = "regularSeason", default)]
    regular_season: Option<RawFeaturedRegularSeason>,
}

#[derive(Debug, Deserialize)]
struct RawFeaturedRegularSeason {
    #[serde(rename = "subSeason", default)]
    sub_season: Option<RawSubSeason>,
}

#[derive(Debug, Deserialize)]
struct RawSubSeason {
    #[serde(rename = "savePctg", default)]
    save_pctg: f64,
}

#[derive(Debug, Deserialize)]
struct RawSeasonTotal {
    #[serde(default)]
    season: i32,
    #[serde(rename = "gameTypeId", default)]
    game_type_id: i32,
    #[serde(rename = "savePctg", default)]
    save_pctg: f64,
}

#[derive(Debug, Deserialize)]
struct RawBoxscore {
    #[serde(rename = "homeTeam", default)]
    home_team: RawTeamRef,
    #[serde(rename = "awayTeam", default)]
    away_team: RawTeamRef,
    #[serde(rename = "playerByGameStats", default)]
    player_stats: RawPlayerByGameStats,
}

impl RawBoxscore {
    fn into_boxscore(self) -> Boxscore {
        let (home_goalies, home_skaters) = self.player_stats.home_team.split();
        let (away_goalies, away_skaters) = self.player_stats.away_team.split();
        Boxscore {
            home_abbrev: self.home_team.abbrev,
            away_abbrev: self.away_team.abbrev,
            home_name: self.home_team.common_name.unwrap_or_default(),
            away_name: self.away_team.common_name.unwrap_or_default(),
            home_goalies,
            away_goalies,
            home_skaters,
            away_skaters,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPlayerByGameStats {
    #[serde(rename = "homeTeam", default)]
    home_team: RawTeamPlayers,
    #[serde(rename = "awayTeam", default)]
    away_team: RawTeamPlayers,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeamPlayers {
    #[serde(default)]
    forwards: Vec<RawSkater>,
    #[serde(default)]
    defense: Vec<RawSkater>,
    #[serde(default)]
    goalies: Vec<RawBoxGoalie>,
}

impl RawTeamPlayers {
    fn split(self) -> (Vec<BoxscoreGoalie>, Vec<SkaterLine>) {
        let goalies = self
            .goalies
            .into_iter()
            .map(|g| BoxscoreGoalie {
                player_id: g.player_id,
                name: g.name,
                starter: g.starter,
            })
            .collect();
        let skaters = self
            .forwards
            .into_iter()
            .chain(self.defense)
            .map(|s| SkaterLine {
                player_id: s.player_id,
                goals: s.goals,
                assists: s.assists,
                points: s.points,
                toi: s.toi,
                shifts: s.shifts,
                sog: s.sog,
            })
            .collect();
        (goalies, skaters)
    }
}

#[derive(Debug, Deserialize)]
struct RawSkater {
    #[serde(rename = "playerId", default)]
    player_id: i64,
    #[serde(default)]
    goals: i32,
    #[serde(default)]
    assists: i32,
    #[serde(default)]
    points: i32,
    #[serde(default)]
    toi: String,
    #[serde(default)]
    shifts: i32,
    #[serde(default)]
    sog: i32,
}

#[derive(Debug, Deserialize)]
struct RawBoxGoalie {
    #[serde(rename = "playerId", default)]
    player_id: i64,
    #[serde(default, deserialize_with = "string_or_localized")]
    name: String,
    #[serde(default)]
    starter: bool,
}

#[derive(Debug, Deserialize)]
struct RawPlayByPlay {
    #[serde(rename = "rosterSpots", default)]
    roster_spots: Vec<RawRosterSpot>,
    #[serde(default)]
    plays: Vec<RawPlay>,
}

#[derive(Debug, Deserialize)]
struct RawRosterSpot {
    #[serde(rename = "playerId", default)]
    player_id: i64,
    #[serde(rename = "firstName", default, deserialize_with = "string_or_localized")]
    first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "string_or_localized")]
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct RawPlay {
    #[serde(rename = "typeDescKey", default)]
    type_desc_key: String,
    #[serde(default)]
    details: Option<RawPlayDetails>,
}

#[derive(Debug, Deserialize)]
struct RawPlayDetails {
    #[serde(rename = "scoringPlayerId", default)]
    scoring_player_id: Option<i64>,
    #[serde(rename = "scoringPlayerTotal", default)]
    scoring_player_total: Option<i32>,
    #[serde(rename = "goalieInNetId", default)]
    goalie_in_net_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawRoster {
    #[serde(default)]
    goalies: Vec<RawRosterGoalie>,
}

#[derive(Debug, Deserialize)]
struct RawRosterGoalie {
    #[serde(default)]
    id: i64,
    #[serde(rename = "firstName", default, deserialize_with = "string_or_localized")]
    first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "string_or_localized")]
    last_name: String,
}
