//! Typed accessors for the shared cache keys.
//!
//! The collector writes, the predictor and evaluator read; every getter
//! treats a missing key as absent data, not an error, so a cold cache only
//! delays the affected step until the next tick.

use std::collections::HashMap;

use anyhow::Result;

use crate::models::{keys, ttl, CalibrationSample, GameLogEntry, PredictionPayload, StandingsTeam};

use super::RedisBus;

pub async fn read_game_log(bus: &RedisBus) -> Result<Vec<GameLogEntry>> {
    Ok(bus.get_json(keys::GAME_LOG).await?.unwrap_or_default())
}

pub async fn write_game_log(bus: &RedisBus, entries: &[GameLogEntry]) -> Result<()> {
    bus.set_json(keys::GAME_LOG, &entries, ttl::GAME_LOG_SECS).await
}

pub async fn read_standings(bus: &RedisBus) -> Result<HashMap<String, StandingsTeam>> {
    Ok(bus.get_json(keys::STANDINGS).await?.unwrap_or_default())
}

pub async fn write_standings(
    bus: &RedisBus,
    standings: &HashMap<String, StandingsTeam>,
) -> Result<()> {
    bus.set_json(keys::STANDINGS, standings, ttl::STANDINGS_SECS).await
}

/// Store the current next-game prediction, plus a long-lived per-game
/// snapshot the evaluator reads after the game ends.
pub async fn write_next_prediction(bus: &RedisBus, payload: &PredictionPayload) -> Result<()> {
    bus.set_json(keys::NEXT_PREDICTION, payload, ttl::NEXT_PREDICTION_SECS)
        .await?;
    bus.set_json(
        &keys::prediction_snapshot(payload.game_id),
        payload,
        ttl::PREDICTION_SNAPSHOT_SECS,
    )
    .await
}

pub async fn read_prediction_snapshot(
    bus: &RedisBus,
    game_id: i64,
) -> Result<Option<PredictionPayload>> {
    bus.get_json(&keys::prediction_snapshot(game_id)).await
}

// ------------------------------------------------------------------
// Reminder idempotency
// ------------------------------------------------------------------

pub async fn reminder_already_sent(bus: &RedisBus, game_id: i64) -> Result<bool> {
    Ok(bus.get_string(&keys::reminder_sent(game_id)).await?.is_some())
}

pub async fn mark_reminder_sent(bus: &RedisBus, game_id: i64) -> Result<()> {
    bus.set_string(&keys::reminder_sent(game_id), "1", ttl::REMINDER_SENT_SECS)
        .await
}

// ------------------------------------------------------------------
// Goal dedup
// ------------------------------------------------------------------

/// Record that a goal (game id + running goal count) has been emitted.
/// Returns true when it was already recorded, i.e. a duplicate that must not
/// be emitted again. The set lives in Redis so restarts share state.
pub async fn mark_goal_seen(bus: &RedisBus, game_id: i64, goals_to_date: i32) -> Result<bool> {
    bus.set_add(
        &keys::seen_goals(game_id),
        &goals_to_date.to_string(),
        ttl::SEEN_GOALS_SECS,
    )
    .await
}

// ------------------------------------------------------------------
// Odds cache
// ------------------------------------------------------------------

pub async fn read_cached_odds(bus: &RedisBus, game_id: i64) -> Result<Option<String>> {
    bus.get_string(&keys::odds(game_id)).await
}

pub async fn write_cached_odds(bus: &RedisBus, game_id: i64, american: &str) -> Result<()> {
    bus.set_string(&keys::odds(game_id), american, ttl::ODDS_SECS).await
}

// ------------------------------------------------------------------
// Calibration log
// ------------------------------------------------------------------

pub async fn append_calibration_sample(bus: &RedisBus, sample: &CalibrationSample) -> Result<()> {
    let raw = serde_json::to_string(sample)?;
    bus.list_push_capped(keys::CALIBRATION_LOG, &raw, ttl::CALIBRATION_KEEP)
        .await
}

/// Newest samples first. Malformed entries are dropped; they count toward
/// neither the hit rate nor the sample minimum.
pub async fn read_calibration_samples(bus: &RedisBus) -> Result<Vec<CalibrationSample>> {
    let raw = bus.list_head(keys::CALIBRATION_LOG, ttl::CALIBRATION_KEEP).await?;
    Ok(raw
        .iter()
        .filter_map(|s| serde_json::from_str(s).ok())
        .collect())
}

// ------------------------------------------------------------------
// Evaluator progress
// ------------------------------------------------------------------

pub async fn last_reported_game(bus: &RedisBus) -> Result<i64> {
    Ok(bus.get_i64(keys::EVALUATOR_LAST_REPORTED).await?.unwrap_or(0))
}

pub async fn set_last_reported_game(bus: &RedisBus, game_id: i64) -> Result<()> {
    bus.set_i64(keys::EVALUATOR_LAST_REPORTED, game_id, ttl::LAST_REPORTED_SECS)
        .await
}
