//! Evaluator service.
//!
//! After each completed game: fetch the subject's boxscore line, compare it
//! against the prediction snapshot, publish exactly one post-game summary,
//! and append a calibration sample for the predictor's scale. The
//! last-reported marker is advanced only after a successful publish so a
//! failed tick retries and a successful one never repeats.

mod report;

use std::time::Duration;

use anyhow::Result;
use dotenv::dotenv;
use log::{error, info, warn};

use goalbot_core::clients::NhlClient;
use goalbot_core::config::SubjectConfig;
use goalbot_core::models::{keys, PostGamePayload};
use goalbot_core::redis::{cache, RedisBus};

const CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);
const TICK_TIMEOUT: Duration = Duration::from_secs(90);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let subject = SubjectConfig::from_env();
    let bus = match RedisBus::connect().await {
        Ok(bus) => bus,
        Err(e) => {
            error!("redis connect failed: {e:#}");
            std::process::exit(1);
        }
    };
    let nhl = NhlClient::new();
    info!("evaluator started: interval={}s", CHECK_INTERVAL.as_secs());

    let mut ticker = tokio::time::interval(CHECK_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("evaluator shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {
                if tokio::time::timeout(TICK_TIMEOUT, run_tick(&nhl, &bus, &subject)).await.is_err() {
                    warn!("evaluator tick exceeded deadline, skipping until next tick");
                }
            }
        }
    }
}

async fn run_tick(nhl: &NhlClient, bus: &RedisBus, subject: &SubjectConfig) {
    let game = match nhl.last_completed_game(&subject.team_abbrev).await {
        Ok(Some(g)) => g,
        Ok(None) => return,
        Err(e) => {
            warn!("last completed game fetch failed: {e}");
            return;
        }
    };

    let last_reported = cache::last_reported_game(bus).await.unwrap_or(0);
    if last_reported >= game.game_id {
        return;
    }

    let snapshot = cache::read_prediction_snapshot(bus, game.game_id)
        .await
        .unwrap_or_default();

    let boxscore = match nhl.boxscore(game.game_id).await {
        Ok(Some(b)) => b,
        Ok(None) => {
            warn!("boxscore not yet available: game_id={}", game.game_id);
            return;
        }
        Err(e) => {
            warn!("boxscore fetch failed: game_id={} error={e}", game.game_id);
            return;
        }
    };
    let Some(stats) = boxscore.skater_line(subject.player_id) else {
        warn!("subject not in boxscore: game_id={}", game.game_id);
        return;
    };
    let scored = stats.goals > 0;

    let message = report::format_summary(
        &game,
        &subject.team_abbrev,
        &subject.player_name,
        stats,
        snapshot.as_ref(),
    );
    info!(
        "publishing post-game summary: game_id={} scored={scored}",
        game.game_id
    );
    if let Err(e) = bus
        .emit(keys::POST_GAME_STREAM, &PostGamePayload { message })
        .await
    {
        warn!("publish to post-game stream failed: {e:#}");
        return;
    }

    if let Some(sample) = report::calibration_sample(snapshot.as_ref(), scored) {
        if let Err(e) = cache::append_calibration_sample(bus, &sample).await {
            warn!("append calibration sample failed: {e:#}");
        }
    }

    // Advance the marker only after the publish above succeeded.
    if let Err(e) = cache::set_last_reported_game(bus, game.game_id).await {
        warn!("set last reported failed: {e:#}");
    }
}
