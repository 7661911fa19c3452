//! Scoring-probability estimator.
//!
//! Produces an integer percentage chance that the subject scores in a given
//! game. The heuristic sub-model multiplies a Poisson-style baseline by a
//! set of independently clamped adjustment factors; with enough history a
//! logistic sub-model trained on the same log is blended in. Market odds and
//! a calibration scale are applied by the caller afterwards, and every stage
//! re-clamps to the same bounds.

pub mod calibration;
mod heuristic;
mod logistic;

pub use heuristic::predict_heuristic;
pub use logistic::logistic_predict;

use std::collections::HashMap;

use crate::models::{Game, GameLogEntry, StandingsTeam};

/// Hard floor and ceiling for every published percentage.
pub const MIN_PCT: i32 = 15;
pub const MAX_PCT: i32 = 75;

/// Returned when the subject has no game-log history at all; the model
/// refuses to extrapolate from nothing.
pub const NO_HISTORY_PCT: i32 = 45;

pub fn clamp_pct(pct: i32) -> i32 {
    pct.clamp(MIN_PCT, MAX_PCT)
}

/// Estimated probability (15-75) that the subject scores in `game`.
///
/// With 50+ games of history and enough derivable training samples the
/// result is the round-average of the heuristic and logistic sub-models;
/// otherwise the heuristic alone. `goalie_save_pct` is the opposing
/// starter's season save percentage (0-1); 0 means unknown and leaves the
/// goalie factor neutral.
pub fn predict(
    game: &Game,
    subject_team: &str,
    game_log: &[GameLogEntry],
    standings: &HashMap<String, StandingsTeam>,
    goalie_save_pct: f64,
) -> i32 {
    if game_log.is_empty() {
        return NO_HISTORY_PCT;
    }
    let heuristic = predict_heuristic(game, subject_team, game_log, standings, goalie_save_pct);
    match logistic_predict(game, subject_team, game_log, standings) {
        Some(logistic) => clamp_pct(((heuristic + logistic) as f64 / 2.0).round() as i32),
        None => heuristic,
    }
}

/// Blend a model percentage with a market-implied percentage (85/15) and
/// re-clamp. Applied by the predictor when odds are available.
pub fn blend_with_market(model_pct: i32, implied_pct: i32) -> i32 {
    clamp_pct((0.85 * model_pct as f64 + 0.15 * implied_pct as f64).round() as i32)
}
