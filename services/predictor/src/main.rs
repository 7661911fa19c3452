//! Predictor service.
//!
//! Every cycle: resolve the next game, load the cached game log and
//! standings, resolve the opposing starter, run the estimator, then layer on
//! market odds and the calibration scale. The result is published as the
//! current next-game prediction plus a per-game snapshot, and a single
//! pre-game reminder goes out inside the 55-65 minute window.

mod config;
mod goalie;
mod odds;
mod reminder;

use anyhow::Result;
use chrono::Utc;
use dotenv::dotenv;
use log::{error, info, warn};

use goalbot_core::clients::NhlClient;
use goalbot_core::config::SubjectConfig;
use goalbot_core::probability::{self, calibration};
use goalbot_core::redis::{cache, RedisBus};

use config::Config;
use goalie::GoalieResolver;
use odds::OddsClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cfg = Config::from_env();
    let subject = SubjectConfig::from_env();
    info!(
        "predictor starting: team={} interval={}s odds_enabled={}",
        subject.team_abbrev,
        cfg.check_interval.as_secs(),
        !cfg.odds_api_key.is_empty()
    );

    let bus = match RedisBus::connect().await {
        Ok(bus) => bus,
        Err(e) => {
            error!("redis connect failed: {e:#}");
            std::process::exit(1);
        }
    };
    let nhl = NhlClient::new();
    let resolver = GoalieResolver::new(nhl.clone());
    let odds_client = OddsClient::new(cfg.odds_api_key.clone());

    let mut ticker = tokio::time::interval(cfg.check_interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("predictor shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {
                let tick = run_tick(&nhl, &bus, &resolver, &odds_client, &subject);
                if tokio::time::timeout(config::TICK_TIMEOUT, tick).await.is_err() {
                    warn!("predictor tick exceeded deadline, skipping until next tick");
                }
            }
        }
    }
}

async fn run_tick(
    nhl: &NhlClient,
    bus: &RedisBus,
    resolver: &GoalieResolver,
    odds_client: &OddsClient,
    subject: &SubjectConfig,
) {
    let game = match nhl.next_game(&subject.team_abbrev).await {
        Ok(Some(g)) => g,
        Ok(None) => {
            info!("no upcoming game: schedule empty or season not active");
            return;
        }
        Err(e) => {
            warn!("next game fetch failed: {e}");
            return;
        }
    };
    let until_start = game.start_time_utc - Utc::now();
    info!(
        "next game: game_id={} opponent={} home={} start_utc={} until_start={}m",
        game.game_id,
        game.opponent(&subject.team_abbrev),
        game.is_home(&subject.team_abbrev),
        game.start_time_utc.to_rfc3339(),
        until_start.num_minutes()
    );

    // Game log; one bounded retry in case the collector is still filling the
    // cache at startup.
    let mut game_log = match cache::read_game_log(bus).await {
        Ok(log) => log,
        Err(e) => {
            warn!("game log read failed: {e:#}");
            return;
        }
    };
    if game_log.is_empty() {
        info!("game log empty, retrying once in {}s", config::GAME_LOG_RETRY_DELAY.as_secs());
        tokio::time::sleep(config::GAME_LOG_RETRY_DELAY).await;
        game_log = cache::read_game_log(bus).await.unwrap_or_default();
        if game_log.is_empty() {
            info!("game log still empty after retry, skipping prediction until next tick");
            return;
        }
    }

    let standings = match cache::read_standings(bus).await {
        Ok(s) => s,
        Err(e) => {
            warn!("standings read failed, using fallbacks: {e:#}");
            Default::default()
        }
    };
    info!(
        "data loaded: game_log_entries={} standings_teams={}",
        game_log.len(),
        standings.len()
    );

    let goalie = resolver.opposing_starter(&game, subject).await;
    let goalie_save_pct = goalie.as_ref().map_or(0.0, |g| g.save_pct);

    let mut pct = probability::predict(&game, &subject.team_abbrev, &game_log, &standings, goalie_save_pct);
    info!("prediction: game_id={} probability_pct={pct}", game.game_id);

    // Odds: per-game cache first; the API is only called inside the fetch
    // window to respect the monthly credit budget.
    let mut odds_american = cache::read_cached_odds(bus, game.game_id)
        .await
        .unwrap_or_default();
    if odds_american.is_none()
        && odds_client.enabled()
        && until_start <= chrono::Duration::hours(config::ODDS_FETCH_WINDOW_HOURS)
    {
        match odds_client.subject_anytime_goal(&game, subject).await {
            Ok(Some(o)) => {
                info!("odds: game_id={} anytime_goal={}", game.game_id, o.american);
                if let Err(e) = cache::write_cached_odds(bus, game.game_id, &o.american).await {
                    warn!("odds cache write failed: {e:#}");
                }
                odds_american = Some(o.american);
            }
            Ok(None) => info!(
                "odds not found for this game: game_id={} hint=no matching event or subject line",
                game.game_id
            ),
            Err(e) => warn!("odds fetch failed: {e:#}"),
        }
    }

    if let Some(american) = &odds_american {
        if let Some(implied) = odds::implied_pct_from_american(american) {
            if implied > 0 {
                let blended = probability::blend_with_market(pct, implied);
                info!("prediction blended with market: model_pct={pct} implied_pct={implied} final_pct={blended}");
                pct = blended;
            }
        }
    }

    // Calibration scale from evaluator history.
    let samples = cache::read_calibration_samples(bus).await.unwrap_or_default();
    let scale = calibration::calibration_scale(&samples);
    if scale != 1.0 {
        let calibrated = calibration::apply_scale(pct, scale);
        info!("prediction calibrated: before={pct} scale={scale:.3} after={calibrated}");
        pct = calibrated;
    }

    let mut payload = goalbot_core::models::PredictionPayload::new(&game, &subject.team_abbrev, pct);
    payload.odds_american = odds_american;
    payload.goalie_name = goalie.map(|g| g.name);
    match cache::write_next_prediction(bus, &payload).await {
        Ok(()) => info!(
            "next prediction written: game_id={} probability_pct={pct}",
            game.game_id
        ),
        Err(e) => warn!("write next prediction failed: {e:#}"),
    }

    // Reminder, exactly once per game inside the window.
    if !reminder::in_reminder_window(until_start) {
        info!(
            "reminder skip: reason=outside_window until_start={}m window={}m-{}m",
            until_start.num_minutes(),
            config::REMINDER_WINDOW_START_MINS,
            config::REMINDER_WINDOW_END_MINS
        );
        return;
    }
    match cache::reminder_already_sent(bus, game.game_id).await {
        Ok(true) => {
            info!("reminder skip: reason=already_sent game_id={}", game.game_id);
            return;
        }
        Ok(false) => {}
        Err(e) => {
            warn!("reminder already-sent check failed: {e:#}");
            return;
        }
    }
    match reminder::publish(bus, &payload).await {
        Ok(()) => info!(
            "reminder published: game_id={} opponent={} probability_pct={pct}",
            game.game_id, payload.opponent
        ),
        Err(e) => warn!("publish reminder failed: {e:#}"),
    }
}
