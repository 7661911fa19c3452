//! Collector service.
//!
//! Periodically fetches the subject's per-season game logs and the league
//! standings, normalizes them and writes both to the shared cache with TTLs.
//! The game log is an append-only concatenation across seasons, oldest
//! first; standings are replaced wholesale each run.

mod config;

use anyhow::Result;
use dotenv::dotenv;
use log::{error, info, warn};

use goalbot_core::clients::NhlClient;
use goalbot_core::config::SubjectConfig;
use goalbot_core::models::GameLogEntry;
use goalbot_core::redis::{cache, RedisBus};

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cfg = Config::from_env();
    let subject = SubjectConfig::from_env();
    info!(
        "collector starting: player_id={} seasons={:?} interval={}s",
        subject.player_id,
        cfg.seasons,
        cfg.collect_interval.as_secs()
    );

    // Cache unreachable at startup is the one fatal condition.
    let bus = match RedisBus::connect().await {
        Ok(bus) => bus,
        Err(e) => {
            error!("redis connect failed: {e:#}");
            std::process::exit(1);
        }
    };
    let nhl = NhlClient::new();

    run(&nhl, &bus, &cfg, &subject).await;

    let mut ticker = tokio::time::interval(cfg.collect_interval);
    ticker.tick().await; // immediate first tick already ran above
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("collector shutting down");
                return Ok(());
            }
            _ = ticker.tick() => run(&nhl, &bus, &cfg, &subject).await,
        }
    }
}

async fn run(nhl: &NhlClient, bus: &RedisBus, cfg: &Config, subject: &SubjectConfig) {
    if tokio::time::timeout(config::RUN_TIMEOUT, run_once(nhl, bus, cfg, subject))
        .await
        .is_err()
    {
        warn!("collector run exceeded deadline, skipping until next tick");
    }
}

async fn run_once(nhl: &NhlClient, bus: &RedisBus, cfg: &Config, subject: &SubjectConfig) {
    let mut all_log: Vec<GameLogEntry> = Vec::new();
    for season in &cfg.seasons {
        match nhl.game_log(subject.player_id, season).await {
            Ok(entries) => all_log.extend(entries),
            Err(e) => warn!("game log fetch failed: season={season} error={e}"),
        }
    }
    if !all_log.is_empty() {
        match cache::write_game_log(bus, &all_log).await {
            Ok(()) => info!("game log updated: entries={}", all_log.len()),
            Err(e) => warn!("write game log failed: {e:#}"),
        }
    }

    let standings = match nhl.standings_now().await {
        Ok(s) => s,
        Err(e) => {
            warn!("standings fetch failed: {e}");
            return;
        }
    };
    match cache::write_standings(bus, &standings).await {
        Ok(()) => info!("standings updated: teams={}", standings.len()),
        Err(e) => warn!("write standings failed: {e:#}"),
    }
}
