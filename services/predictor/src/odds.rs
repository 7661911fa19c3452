//! The Odds API client for the subject's anytime-goal line.
//!
//! Two calls per fetch: list NHL events to find the one matching our game
//! (commence time within 90 minutes of the scheduled start plus a team-name
//! match), then pull the `player_goal_scorer_anytime` market and pick the
//! subject's outcome. Results are cached per game id by the caller, and the
//! client is a no-op without an API key.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use goalbot_core::config::SubjectConfig;
use goalbot_core::models::{teams, Game};

const BASE_URL: &str = "https://api.the-odds-api.com/v4";
const SPORT_KEY: &str = "icehockey_nhl";
const ANYTIME_MARKET: &str = "player_goal_scorer_anytime";
/// Odds events rarely carry the exact puck-drop minute; match within this.
const COMMENCE_TOLERANCE_MINS: i64 = 90;

#[derive(Debug, Clone)]
pub struct AnytimeOdds {
    /// e.g. "+140" or "-150".
    pub american: String,
    pub price: i32,
}

pub struct OddsClient {
    api_key: String,
    http: Client,
}

impl OddsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Subject's anytime-goal odds for the game; None when disabled, the
    /// game has no matching event, or the line is not offered.
    pub async fn subject_anytime_goal(
        &self,
        game: &Game,
        subject: &SubjectConfig,
    ) -> Result<Option<AnytimeOdds>> {
        if !self.enabled() {
            return Ok(None);
        }
        let Some(event_id) = self.find_event_id(game, &subject.team_abbrev).await? else {
            return Ok(None);
        };
        self.fetch_anytime_odds(&event_id, subject).await
    }

    async fn find_event_id(&self, game: &Game, subject_team: &str) -> Result<Option<String>> {
        let url = format!(
            "{BASE_URL}/sports/{SPORT_KEY}/events?apiKey={}",
            urlencode(&self.api_key)
        );
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("odds events status {}", resp.status().as_u16()));
        }
        let events: Vec<OddsEvent> = resp.json().await?;
        let fragments = teams::matchup_fragments(subject_team);
        Ok(events
            .into_iter()
            .find(|e| event_matches(e, game.start_time_utc, &fragments))
            .map(|e| e.id))
    }

    async fn fetch_anytime_odds(
        &self,
        event_id: &str,
        subject: &SubjectConfig,
    ) -> Result<Option<AnytimeOdds>> {
        let url = format!(
            "{BASE_URL}/sports/{SPORT_KEY}/events/{}/odds?apiKey={}&regions=us&markets={ANYTIME_MARKET}&oddsFormat=american",
            urlencode(event_id),
            urlencode(&self.api_key)
        );
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("event odds status {}", resp.status().as_u16()));
        }
        let data: OddsEventOdds = resp.json().await?;
        for bookmaker in &data.bookmakers {
            for market in &bookmaker.markets {
                if market.key != ANYTIME_MARKET {
                    continue;
                }
                for outcome in &market.outcomes {
                    if outcome.description.contains(subject.last_name())
                        && (outcome.name == "Yes" || outcome.name == subject.player_name)
                    {
                        return Ok(Some(AnytimeOdds {
                            american: format_american(outcome.price),
                            price: outcome.price,
                        }));
                    }
                }
            }
        }
        Ok(None)
    }
}

fn event_matches(event: &OddsEvent, game_start: DateTime<Utc>, fragments: &[&str]) -> bool {
    let Ok(commence) = DateTime::parse_from_rfc3339(&event.commence_time) else {
        return false;
    };
    let diff = (game_start - commence.with_timezone(&Utc)).num_minutes().abs();
    if diff > COMMENCE_TOLERANCE_MINS {
        return false;
    }
    let home = event.home_team.to_lowercase();
    let away = event.away_team.to_lowercase();
    fragments.iter().any(|f| {
        let f = f.to_lowercase();
        home.contains(&f) || away.contains(&f)
    })
}

/// Implied probability (0-100) from American odds, integer arithmetic.
pub fn implied_pct(american: i32) -> i32 {
    if american >= 0 {
        100 * 100 / (100 + american)
    } else {
        100 * (-american) / (100 + (-american))
    }
}

/// Parse a stored American odds string (e.g. "+140") and return the implied
/// percentage; None for anything unparseable.
pub fn implied_pct_from_american(american: &str) -> Option<i32> {
    let cleaned = american.trim().trim_start_matches('+');
    let price: i32 = cleaned.parse().ok()?;
    Some(implied_pct(price))
}

fn format_american(price: i32) -> String {
    if price > 0 {
        format!("+{price}")
    } else {
        format!("{price}")
    }
}

/// Query-string escaping for the few characters API keys and ids can carry.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct OddsEvent {
    id: String,
    #[serde(default)]
    commence_time: String,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
}

#[derive(Debug, Deserialize)]
struct OddsEventOdds {
    #[serde(default)]
    bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Deserialize)]
struct OddsBookmaker {
    #[serde(default)]
    markets: Vec<OddsMarket>,
}

#[derive(Debug, Deserialize)]
struct OddsMarket {
    #[serde(default)]
    key: String,
    #[serde(default)]
    outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Deserialize)]
struct OddsOutcome {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: i32,
}
