//! Logistic sub-model.
//!
//! A 5-weight logistic regression retrained from scratch on every prediction
//! from the subject's own game log. Hyperparameters are fixed constants with
//! no convergence check, no regularization and no held-out validation; the
//! documented behavior is preserved as-is and the outputs are blended, never
//! trusted alone.

use std::collections::HashMap;

use crate::models::{Game, GameLogEntry, StandingsTeam};

use super::clamp_pct;
use super::heuristic::{baseline_gpg, effective_ga_per_game, league_avg_ga, BASELINE_GAMES_MAX, RECENT_GAMES};

/// Minimum games of history before the model trains at all.
const MIN_GAMES: usize = 50;
/// Minimum derivable training samples.
const MIN_SAMPLES: usize = 20;
/// Each sample needs this many prior games for feature computation.
const MIN_PRIOR_GAMES: usize = 6;
const ITERATIONS: usize = 400;
const LEARNING_RATE: f64 = 0.15;
/// [intercept, home, opponent GA ratio, baseline GPG, recent-form ratio]
const FEATURES: usize = 5;

struct Sample {
    x: [f64; FEATURES],
    y: f64,
}

/// Percentage in [15, 75] from the trained model, or None when there is not
/// enough history to train (the caller then uses the heuristic alone).
pub fn logistic_predict(
    game: &Game,
    subject_team: &str,
    game_log: &[GameLogEntry],
    standings: &HashMap<String, StandingsTeam>,
) -> Option<i32> {
    if game_log.len() < MIN_GAMES {
        return None;
    }
    let league_ga = league_avg_ga(standings);
    let samples = build_samples(game_log, standings, league_ga);
    if samples.len() < MIN_SAMPLES {
        return None;
    }
    let weights = train(&samples);

    let x = features(
        game.is_home(subject_team),
        opponent_ga_ratio(
            standings.get(game.opponent(subject_team)),
            game.is_home(subject_team),
            league_ga,
        ),
        baseline_gpg(game_log, BASELINE_GAMES_MAX),
        recent_ratio(game_log),
    );
    let p = sigmoid(dot(&weights, &x));
    Some(clamp_pct((p * 100.0).round() as i32))
}

/// One sample per historical game with enough prior history, features
/// computed from the games before it only.
fn build_samples(
    game_log: &[GameLogEntry],
    standings: &HashMap<String, StandingsTeam>,
    league_ga: f64,
) -> Vec<Sample> {
    let mut samples = Vec::new();
    for i in MIN_PRIOR_GAMES..game_log.len() {
        let entry = &game_log[i];
        let prior = &game_log[..i];
        let x = features(
            entry.is_home(),
            opponent_ga_ratio(standings.get(&entry.opponent_abbrev), entry.is_home(), league_ga),
            baseline_gpg(prior, BASELINE_GAMES_MAX),
            recent_ratio(prior),
        );
        samples.push(Sample {
            x,
            y: if entry.goals > 0 { 1.0 } else { 0.0 },
        });
    }
    samples
}

fn features(home: bool, opp_ga_ratio: f64, baseline: f64, recent: f64) -> [f64; FEATURES] {
    [1.0, if home { 1.0 } else { 0.0 }, opp_ga_ratio, baseline, recent]
}

fn opponent_ga_ratio(team: Option<&StandingsTeam>, subject_is_home: bool, league_ga: f64) -> f64 {
    let opp_ga = match team {
        Some(t) if t.games_played > 0 => effective_ga_per_game(t, subject_is_home),
        _ => league_ga,
    };
    opp_ga / league_ga
}

fn recent_ratio(game_log: &[GameLogEntry]) -> f64 {
    let baseline = baseline_gpg(game_log, BASELINE_GAMES_MAX);
    let n = RECENT_GAMES.min(game_log.len());
    if n == 0 || baseline <= 0.0 {
        return 1.0;
    }
    let recent_goals: i32 = game_log[game_log.len() - n..].iter().map(|e| e.goals).sum();
    (recent_goals as f64 / n as f64) / baseline
}

/// Gradient descent on log-loss, per-sample updates scaled by 1/n, fixed
/// iteration count, weights from zero.
fn train(samples: &[Sample]) -> [f64; FEATURES] {
    let mut w = [0.0f64; FEATURES];
    let n = samples.len() as f64;
    for _ in 0..ITERATIONS {
        for s in samples {
            let p = sigmoid(dot(&w, &s.x));
            // d/dw of -[y ln p + (1-y) ln(1-p)] = (p - y) x
            let err = p - s.y;
            for k in 0..FEATURES {
                w[k] -= LEARNING_RATE * err * s.x[k] / n;
            }
        }
    }
    w
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z > 20.0 {
        return 1.0;
    }
    if z < -20.0 {
        return 0.0;
    }
    1.0 / (1.0 + (-z).exp())
}

fn dot(a: &[f64; FEATURES], b: &[f64; FEATURES]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn upcoming_game() -> Game {
        Game {
            game_id: 99,
            home_abbrev: "WSH".into(),
            away_abbrev: "PHI".into(),
            start_time_utc: Utc::now() + Duration::hours(24),
            game_state: "FUT".into(),
            game_date: String::new(),
            venue: String::new(),
        }
    }

    fn make_game_log(n: usize) -> Vec<GameLogEntry> {
        (0..n)
            .map(|i| GameLogEntry {
                game_id: i as i64,
                game_date: "2025-01-01".into(),
                opponent_abbrev: "PHI".into(),
                home_road_flag: if i % 2 == 0 { "H" } else { "R" }.into(),
                goals: if i % 5 < 2 { 1 } else { 0 },
            })
            .collect()
    }

    #[test]
    fn test_logistic_unavailable_below_min_games() {
        for n in [0, 10, 49] {
            let log = make_game_log(n);
            assert!(
                logistic_predict(&upcoming_game(), "WSH", &log, &HashMap::new()).is_none(),
                "n={n}"
            );
        }
    }

    #[test]
    fn test_logistic_available_at_threshold() {
        // 50 games gives 44 samples, above the 20-sample minimum.
        let log = make_game_log(50);
        let got = logistic_predict(&upcoming_game(), "WSH", &log, &HashMap::new()).unwrap();
        assert!((15..=75).contains(&got), "got {got}");
    }

    #[test]
    fn test_logistic_bounded_for_extreme_logs() {
        // Scoring every game pushes the raw sigmoid toward 1; the clamp holds.
        let hot: Vec<GameLogEntry> = (0..60)
            .map(|i| GameLogEntry {
                game_id: i,
                game_date: "2025-01-01".into(),
                opponent_abbrev: "PHI".into(),
                home_road_flag: "H".into(),
                goals: 2,
            })
            .collect();
        let got = logistic_predict(&upcoming_game(), "WSH", &hot, &HashMap::new()).unwrap();
        assert!((15..=75).contains(&got));

        let cold: Vec<GameLogEntry> = (0..60)
            .map(|i| GameLogEntry {
                game_id: i,
                game_date: "2025-01-01".into(),
                opponent_abbrev: "PHI".into(),
                home_road_flag: "R".into(),
                goals: 0,
            })
            .collect();
        let got = logistic_predict(&upcoming_game(), "WSH", &cold, &HashMap::new()).unwrap();
        assert_eq!(got, 15);
    }

    #[test]
    fn test_logistic_deterministic() {
        let log = make_game_log(70);
        let a = logistic_predict(&upcoming_game(), "WSH", &log, &HashMap::new());
        let b = logistic_predict(&upcoming_game(), "WSH", &log, &HashMap::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sigmoid_cutoffs() {
        assert_eq!(sigmoid(25.0), 1.0);
        assert_eq!(sigmoid(-25.0), 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-9);
        assert!(sigmoid(2.0) > 0.5 && sigmoid(2.0) < 1.0);
    }

    #[test]
    fn test_train_learns_direction() {
        // Outcome follows the home flag exactly; the home weight must end up
        // positive and dominate.
        let samples: Vec<Sample> = (0..40)
            .map(|i| {
                let home = i % 2 == 0;
                Sample {
                    x: features(home, 1.0, 0.5, 1.0),
                    y: if home { 1.0 } else { 0.0 },
                }
            })
            .collect();
        let w = train(&samples);
        assert!(w[1] > 0.0, "home weight {w:?}");
        let p_home = sigmoid(dot(&w, &features(true, 1.0, 0.5, 1.0)));
        let p_road = sigmoid(dot(&w, &features(false, 1.0, 0.5, 1.0)));
        assert!(p_home > p_road);
    }
}
