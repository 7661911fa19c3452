//! Ingestor service.
//!
//! Polls the live scoreboard and emits one goal event per new subject goal,
//! deduplicated through the shared Redis set so neither poll cycles nor
//! restarts re-announce a goal.

mod config;
mod detector;

use anyhow::Result;
use dotenv::dotenv;
use log::{error, info, warn};

use goalbot_core::clients::NhlClient;
use goalbot_core::config::SubjectConfig;
use goalbot_core::models::keys;
use goalbot_core::redis::RedisBus;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cfg = Config::from_env();
    let subject = SubjectConfig::from_env();

    let bus = match RedisBus::connect().await {
        Ok(bus) => bus,
        Err(e) => {
            error!("redis connect failed: {e:#}");
            std::process::exit(1);
        }
    };
    let nhl = NhlClient::new();

    // Seed the tracked career total from the authoritative landing count.
    // Without it every announcement would carry a wrong total, so this
    // startup fetch is fatal like the cache connection.
    let mut career_total = match nhl.career_goals(subject.player_id).await {
        Ok(goals) => goals,
        Err(e) => {
            error!("initial career goals fetch failed: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "ingestor started: stream={} current_goals={career_total} poll_interval={}s",
        keys::GOALS_STREAM,
        cfg.poll_interval.as_secs()
    );

    let mut ticker = tokio::time::interval(cfg.poll_interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ingestor shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {
                let tick = detector::run_tick(&nhl, &bus, &subject, &mut career_total);
                if tokio::time::timeout(config::TICK_TIMEOUT, tick).await.is_err() {
                    warn!("ingestor tick exceeded deadline, skipping until next tick");
                }
            }
        }
    }
}
