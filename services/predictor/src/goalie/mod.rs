//! Opposing-starter resolution.
//!
//! An ordered list of sources, first present result wins:
//!
//! 1. [`DepthChartSource`] scrapes the third-party starting-goalies page
//!    (no game id required there, only the matchup), then cross-references
//!    the scraped name against the opponent's official roster for a
//!    normalized name and the season save percentage. A name that fails the
//!    roster check is discarded rather than trusted.
//! 2. [`BoxscoreSource`] uses the official boxscore starter flag, which only
//!    appears near puck drop but is authoritative when present.
//!
//! Both sources exhausted means "unknown" and the goalie factor stays
//! neutral.

pub mod depth_chart;

use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;

use goalbot_core::clients::NhlClient;
use goalbot_core::config::SubjectConfig;
use goalbot_core::matching::match_roster_goalie;
use goalbot_core::models::{Game, GoalieInfo};

use depth_chart::MatchupHints;

const DEPTH_CHART_URL: &str =
    "https://depth-charts.puckpedia.com/starting-goalies?dayCount=2&timezone=America/New_York";
/// Cap on fetched markup; the goalie cards sit well inside this.
const MAX_MARKUP_BYTES: usize = 512 * 1024;

#[async_trait]
pub trait StarterSource: Send + Sync {
    fn name(&self) -> &'static str;
    /// Present when this source can identify the opposing starter.
    async fn starter(&self, game: &Game, subject: &SubjectConfig) -> Option<GoalieInfo>;
}

/// Tries each source in order and stops at the first success.
pub struct GoalieResolver {
    sources: Vec<Box<dyn StarterSource>>,
}

impl GoalieResolver {
    pub fn new(nhl: NhlClient) -> Self {
        Self {
            sources: vec![
                Box::new(DepthChartSource::new(nhl.clone())),
                Box::new(BoxscoreSource { nhl }),
            ],
        }
    }

    pub async fn opposing_starter(&self, game: &Game, subject: &SubjectConfig) -> Option<GoalieInfo> {
        for source in &self.sources {
            if let Some(info) = source.starter(game, subject).await {
                info!(
                    "goalie resolved: source={} name={} save_pct={:.3}",
                    source.name(),
                    info.name,
                    info.save_pct
                );
                return Some(info);
            }
        }
        info!(
            "goalie unresolved: opponent={} hint=lineup not yet published",
            game.opponent(&subject.team_abbrev)
        );
        None
    }
}

pub struct DepthChartSource {
    nhl: NhlClient,
    http: Client,
    url: String,
}

impl DepthChartSource {
    pub fn new(nhl: NhlClient) -> Self {
        Self {
            nhl,
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent("Mozilla/5.0 (compatible; goalbot/1.0) Chrome/120.0.0.0")
                .build()
                .unwrap_or_else(|_| Client::new()),
            url: DEPTH_CHART_URL.to_string(),
        }
    }

    async fn fetch_markup(&self) -> Option<String> {
        let resp = match self.http.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("depth chart fetch failed: {e}");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("depth chart status {}", resp.status().as_u16());
            return None;
        }
        let mut body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("depth chart read failed: {e}");
                return None;
            }
        };
        if body.len() > MAX_MARKUP_BYTES {
            let mut end = MAX_MARKUP_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        Some(body)
    }
}

#[async_trait]
impl StarterSource for DepthChartSource {
    fn name(&self) -> &'static str {
        "depth-chart"
    }

    async fn starter(&self, game: &Game, subject: &SubjectConfig) -> Option<GoalieInfo> {
        let hints = MatchupHints::for_game(game, &subject.team_abbrev)?;
        let markup = self.fetch_markup().await?;
        let scraped = depth_chart::starter_from_markup(&markup, &hints)?;

        // Scraped text is never authoritative: only a roster hit upgrades it
        // to a usable name (and gives us the id for the save percentage).
        let opponent = game.opponent(&subject.team_abbrev);
        let goalies = match self.nhl.roster_goalies(opponent).await {
            Ok(g) => g,
            Err(e) => {
                warn!("roster fetch failed: team={opponent} error={e}");
                return None;
            }
        };
        let Some(matched) = match_roster_goalie(&goalies, &scraped) else {
            warn!("scraped goalie not on opponent roster, discarding: name={scraped} opponent={opponent}");
            return None;
        };
        let save_pct = self.nhl.player_save_pct(matched.player_id).await.unwrap_or(0.0);
        Some(GoalieInfo {
            name: matched.display_name,
            save_pct,
        })
    }
}

pub struct BoxscoreSource {
    nhl: NhlClient,
}

#[async_trait]
impl StarterSource for BoxscoreSource {
    fn name(&self) -> &'static str {
        "boxscore"
    }

    async fn starter(&self, game: &Game, subject: &SubjectConfig) -> Option<GoalieInfo> {
        let boxscore = match self.nhl.boxscore(game.game_id).await {
            Ok(b) => b?,
            Err(e) => {
                warn!("boxscore fetch failed: game_id={} error={e}", game.game_id);
                return None;
            }
        };
        let starter = boxscore.opposing_starter(&subject.team_abbrev)?;
        let save_pct = self.nhl.player_save_pct(starter.player_id).await.unwrap_or(0.0);
        Some(GoalieInfo {
            name: starter.name.clone(),
            save_pct,
        })
    }
}
