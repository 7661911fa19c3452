//! Heuristic sub-model: Poisson baseline times clamped adjustment factors.
//!
//! The baseline conversion `1 - e^(-rate)` is the only principled step here;
//! every factor after it is an ad hoc multiplicative correction. Each factor
//! clamps independently so extreme inputs cannot compound, and any factor
//! with too small a sample degrades to 1.0 instead of failing the whole
//! prediction.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Game, GameLogEntry, StandingsTeam};

use super::clamp_pct;

/// Baseline window: at most one season's worth of games.
pub(crate) const BASELINE_GAMES_MAX: usize = 82;
/// Recent-form window.
pub(crate) const RECENT_GAMES: usize = 5;
/// Head-to-head window and minimum sample.
const VS_OPPONENT_GAMES_MAX: usize = 10;
const VS_OPPONENT_GAMES_MIN: usize = 3;
/// League averages used when standings are missing.
pub(crate) const FALLBACK_LEAGUE_GA: f64 = 3.0;
const FALLBACK_LEAGUE_PACE: f64 = 3.0;
/// League-average save percentage for the goalie strength factor.
const LEAGUE_AVG_SAVE_PCT: f64 = 0.905;

/// Heuristic percentage in [15, 75].
pub fn predict_heuristic(
    game: &Game,
    subject_team: &str,
    game_log: &[GameLogEntry],
    standings: &HashMap<String, StandingsTeam>,
    goalie_save_pct: f64,
) -> i32 {
    // Baseline GPG from the last N games only so it reflects current form,
    // not a whole career.
    let baseline = baseline_gpg(game_log, BASELINE_GAMES_MAX);
    let base_prob = 1.0 - (-baseline).exp();

    let subject_home = game.is_home(subject_team);
    let opponent = game.opponent(subject_team);
    let league_ga = league_avg_ga(standings);

    let opp = opponent_factor(standings.get(opponent), subject_home, league_ga);
    let home = if subject_home { 1.05 } else { 0.95 };
    let recent = recent_form_factor(game_log, baseline);
    let vs_opp = vs_opponent_factor(game_log, opponent, baseline);
    let strength = strength_factor(standings.get(opponent));
    let pace = pace_factor(standings.get(opponent), league_pace(standings));
    let rest = rest_factor(game, game_log);
    let goalie = goalie_factor(goalie_save_pct);

    let prob = base_prob * opp * home * recent * vs_opp * strength * pace * rest * goalie;
    clamp_pct((prob * 100.0).round() as i32)
}

/// Goals per game over the most recent `max_games` entries. The window never
/// extends past `max_games` even when more data exists.
pub(crate) fn baseline_gpg(game_log: &[GameLogEntry], max_games: usize) -> f64 {
    if game_log.is_empty() {
        return 0.4;
    }
    let start = game_log.len().saturating_sub(max_games);
    let window = &game_log[start..];
    let goals: i32 = window.iter().map(|e| e.goals).sum();
    goals as f64 / window.len() as f64
}

/// Full-season league average goals-against per game.
pub(crate) fn league_avg_ga(standings: &HashMap<String, StandingsTeam>) -> f64 {
    let (sum_ga, sum_gp) = standings
        .values()
        .fold((0i64, 0i64), |(ga, gp), t| {
            (ga + t.goal_against as i64, gp + t.games_played as i64)
        });
    if sum_gp == 0 {
        return FALLBACK_LEAGUE_GA;
    }
    sum_ga as f64 / sum_gp as f64
}

/// League pace per team-side: (GF+GA)/(2*GP), so the scale matches the
/// goals-against fallback.
fn league_pace(standings: &HashMap<String, StandingsTeam>) -> f64 {
    let (sum_goals, sum_gp) = standings.values().fold((0i64, 0i64), |(goals, gp), t| {
        (
            goals + t.goal_for as i64 + t.goal_against as i64,
            gp + t.games_played as i64,
        )
    });
    if sum_gp == 0 {
        return FALLBACK_LEAGUE_PACE;
    }
    sum_goals as f64 / (2.0 * sum_gp as f64)
}

/// Opponent goals-against per game: venue split when the opponent has played
/// at least 5 games at that venue, blended 70/30 with last-10 form when at
/// least 5 recent games are available; season-wide otherwise.
pub(crate) fn effective_ga_per_game(team: &StandingsTeam, subject_is_home: bool) -> f64 {
    if team.games_played == 0 {
        return FALLBACK_LEAGUE_GA;
    }
    // When the subject is home the opponent plays on the road.
    let (venue_gp, venue_ga) = if subject_is_home {
        (team.road_games_played, team.road_goals_against)
    } else {
        (team.home_games_played, team.home_goals_against)
    };
    let base = if venue_gp >= 5 {
        venue_ga as f64 / venue_gp as f64
    } else {
        team.goal_against as f64 / team.games_played as f64
    };
    if team.l10_games_played < 5 {
        return base;
    }
    let l10 = team.l10_goals_against as f64 / team.l10_games_played as f64;
    0.7 * base + 0.3 * l10
}

/// More goals allowed by the opponent raises the subject's chance, relative
/// to the league average.
fn opponent_factor(team: Option<&StandingsTeam>, subject_is_home: bool, league_ga: f64) -> f64 {
    match team {
        Some(t) if t.games_played > 0 => {
            let ga = effective_ga_per_game(t, subject_is_home);
            (ga / league_ga).clamp(0.75, 1.35)
        }
        _ => 1.0,
    }
}

/// Last-5 scoring relative to the baseline rate.
fn recent_form_factor(game_log: &[GameLogEntry], baseline: f64) -> f64 {
    let n = RECENT_GAMES.min(game_log.len());
    if n == 0 || baseline <= 0.0 {
        return 1.0;
    }
    let recent_goals: i32 = game_log[game_log.len() - n..].iter().map(|e| e.goals).sum();
    ((recent_goals as f64 / n as f64) / baseline).clamp(0.6, 1.4)
}

/// Subject's scoring against this specific opponent, over the last few
/// meetings. Needs a minimum head-to-head sample to move off neutral.
pub(crate) fn vs_opponent_factor(game_log: &[GameLogEntry], opponent: &str, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return 1.0;
    }
    let mut games = 0usize;
    let mut goals = 0i32;
    for e in game_log.iter().rev() {
        if e.opponent_abbrev != opponent {
            continue;
        }
        games += 1;
        goals += e.goals;
        if games == VS_OPPONENT_GAMES_MAX {
            break;
        }
    }
    if games < VS_OPPONENT_GAMES_MIN {
        return 1.0;
    }
    ((goals as f64 / games as f64) / baseline).clamp(0.85, 1.15)
}

/// Better overall opponents suppress scoring slightly.
fn strength_factor(team: Option<&StandingsTeam>) -> f64 {
    match team {
        Some(t) if t.point_pctg > 0.0 => (0.96 + 0.08 * t.point_pctg).clamp(0.92, 1.08),
        _ => 1.0,
    }
}

/// Opponent's recent pace relative to the league; needs at least 5 recent
/// games.
fn pace_factor(team: Option<&StandingsTeam>, league_pace: f64) -> f64 {
    match team {
        Some(t) if t.l10_games_played >= 5 && league_pace > 0.0 => {
            let opp_pace = (t.l10_goals_for + t.l10_goals_against) as f64
                / (2.0 * t.l10_games_played as f64);
            (opp_pace / league_pace).clamp(0.97, 1.03)
        }
        _ => 1.0,
    }
}

/// Back-to-back penalty / rest bonus from the gap between the subject's last
/// played date and this game's date.
pub(crate) fn rest_factor(game: &Game, game_log: &[GameLogEntry]) -> f64 {
    let Some(last) = game_log.last() else {
        return 1.0;
    };
    let Ok(last_date) = NaiveDate::parse_from_str(&last.game_date, "%Y-%m-%d") else {
        return 1.0;
    };
    let next_date = game.start_time_utc.date_naive();
    let days_between = (next_date - last_date).num_days();
    match days_between {
        d if d <= 1 => 0.92, // back-to-back
        d if d >= 2 => 1.02, // rested
        _ => 1.0,
    }
}

/// Season save percentage relative to league average; unknown or nonsensical
/// values stay neutral.
fn goalie_factor(save_pct: f64) -> f64 {
    if save_pct > 0.0 && save_pct < 1.0 {
        (LEAGUE_AVG_SAVE_PCT / save_pct).clamp(0.88, 1.12)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(date: &str, opponent: &str, goals: i32) -> GameLogEntry {
        GameLogEntry {
            game_id: 1,
            game_date: date.into(),
            opponent_abbrev: opponent.into(),
            home_road_flag: "H".into(),
            goals,
        }
    }

    fn game_starting_now() -> Game {
        Game {
            game_id: 7,
            home_abbrev: "WSH".into(),
            away_abbrev: "PHI".into(),
            start_time_utc: Utc::now(),
            game_state: "FUT".into(),
            game_date: Utc::now().format("%Y-%m-%d").to_string(),
            venue: String::new(),
        }
    }

    #[test]
    fn test_baseline_gpg_caps_window() {
        // 100 games, goals only in the first 18: the 82-game window must not
        // reach back to them.
        let mut log: Vec<GameLogEntry> = (0..18).map(|_| entry("2024-01-01", "PHI", 2)).collect();
        log.extend((0..82).map(|_| entry("2024-03-01", "PHI", 0)));
        assert_eq!(baseline_gpg(&log, BASELINE_GAMES_MAX), 0.0);
    }

    #[test]
    fn test_baseline_gpg_empty_default() {
        assert!((baseline_gpg(&[], BASELINE_GAMES_MAX) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_league_avg_ga_fallback() {
        assert!((league_avg_ga(&HashMap::new()) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_opponent_factor_clamped_at_extreme_ga() {
        // 50 goals against per game must still clamp at 1.35.
        let team = StandingsTeam {
            team_abbrev: "PHI".into(),
            games_played: 10,
            goal_against: 500,
            ..Default::default()
        };
        let f = opponent_factor(Some(&team), true, 3.0);
        assert!((f - 1.35).abs() < 1e-9);
    }

    #[test]
    fn test_opponent_factor_clamped_low() {
        let team = StandingsTeam {
            team_abbrev: "PHI".into(),
            games_played: 10,
            goal_against: 1,
            ..Default::default()
        };
        let f = opponent_factor(Some(&team), true, 3.0);
        assert!((f - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_opponent_factor_missing_team_neutral() {
        assert_eq!(opponent_factor(None, true, 3.0), 1.0);
    }

    #[test]
    fn test_effective_ga_uses_venue_split() {
        // Opponent leaks on the road (5 road games, 25 GA) but is average at
        // home; subject is home, so the road split applies.
        let team = StandingsTeam {
            team_abbrev: "PHI".into(),
            games_played: 20,
            goal_against: 60,
            road_games_played: 5,
            road_goals_against: 25,
            home_games_played: 15,
            home_goals_against: 35,
            ..Default::default()
        };
        assert!((effective_ga_per_game(&team, true) - 5.0).abs() < 1e-9);
        // Subject away: home split (35/15).
        assert!((effective_ga_per_game(&team, false) - 35.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_effective_ga_blends_last_10() {
        let team = StandingsTeam {
            team_abbrev: "PHI".into(),
            games_played: 20,
            goal_against: 60, // 3.0 per game
            l10_games_played: 10,
            l10_goals_against: 40, // 4.0 per game
            ..Default::default()
        };
        // Fewer than 5 venue games: season 3.0 blended 70/30 with l10 4.0.
        assert!((effective_ga_per_game(&team, true) - (0.7 * 3.0 + 0.3 * 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_recent_form_clamps() {
        // 5 straight multi-goal games against a weak baseline.
        let log: Vec<GameLogEntry> = (0..5).map(|_| entry("2024-01-01", "PHI", 3)).collect();
        assert!((recent_form_factor(&log, 0.3) - 1.4).abs() < 1e-9);
        // Scoreless streak clamps low.
        let cold: Vec<GameLogEntry> = (0..5).map(|_| entry("2024-01-01", "PHI", 0)).collect();
        assert!((recent_form_factor(&cold, 2.0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_recent_form_zero_baseline_neutral() {
        let log: Vec<GameLogEntry> = (0..5).map(|_| entry("2024-01-01", "PHI", 1)).collect();
        assert_eq!(recent_form_factor(&log, 0.0), 1.0);
    }

    #[test]
    fn test_vs_opponent_too_few_meetings() {
        let log = vec![entry("2024-01-01", "PHI", 1), entry("2024-01-03", "PHI", 1)];
        assert_eq!(vs_opponent_factor(&log, "PHI", 0.5), 1.0);
    }

    #[test]
    fn test_vs_opponent_zero_baseline() {
        let log: Vec<GameLogEntry> = (0..3).map(|_| entry("2024-01-01", "PHI", 1)).collect();
        assert_eq!(vs_opponent_factor(&log, "PHI", 0.0), 1.0);
    }

    #[test]
    fn test_vs_opponent_clamp_high() {
        // 3 goals/game vs a 0.3 baseline: ratio 10, clamped to 1.15.
        let log: Vec<GameLogEntry> = (0..5).map(|_| entry("2024-01-01", "PHI", 3)).collect();
        assert!((vs_opponent_factor(&log, "PHI", 0.3) - 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_vs_opponent_clamp_low() {
        let log: Vec<GameLogEntry> = (0..5).map(|_| entry("2024-01-01", "PHI", 0)).collect();
        assert!((vs_opponent_factor(&log, "PHI", 2.0) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_vs_opponent_window_is_ten_meetings() {
        // 10 recent scoreless meetings, older ones full of goals.
        let mut log: Vec<GameLogEntry> = (0..10).map(|_| entry("2023-01-01", "PHI", 4)).collect();
        log.extend((0..10).map(|_| entry("2024-01-01", "PHI", 0)));
        assert!((vs_opponent_factor(&log, "PHI", 1.0) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_strength_factor_clamps() {
        let strong = StandingsTeam {
            point_pctg: 0.9,
            ..Default::default()
        };
        // 0.96 + 0.08*0.9 = 1.032
        assert!((strength_factor(Some(&strong)) - 1.032).abs() < 1e-9);
        assert_eq!(strength_factor(None), 1.0);
        let unknown = StandingsTeam::default();
        assert_eq!(strength_factor(Some(&unknown)), 1.0);
    }

    #[test]
    fn test_pace_factor_bounds_and_minimum_sample() {
        let fast = StandingsTeam {
            l10_games_played: 10,
            l10_goals_for: 60,
            l10_goals_against: 60, // pace 6.0 vs league 3.0
            ..Default::default()
        };
        assert!((pace_factor(Some(&fast), 3.0) - 1.03).abs() < 1e-9);
        let slow = StandingsTeam {
            l10_games_played: 10,
            l10_goals_for: 10,
            l10_goals_against: 10,
            ..Default::default()
        };
        assert!((pace_factor(Some(&slow), 3.0) - 0.97).abs() < 1e-9);
        let thin = StandingsTeam {
            l10_games_played: 4,
            l10_goals_for: 40,
            l10_goals_against: 40,
            ..Default::default()
        };
        assert_eq!(pace_factor(Some(&thin), 3.0), 1.0);
    }

    #[test]
    fn test_rest_factor_empty_log() {
        assert_eq!(rest_factor(&game_starting_now(), &[]), 1.0);
    }

    #[test]
    fn test_rest_factor_back_to_back() {
        let yesterday = (Utc::now() - Duration::hours(24)).format("%Y-%m-%d").to_string();
        let log = vec![entry(&yesterday, "PHI", 0)];
        assert!((rest_factor(&game_starting_now(), &log) - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_rest_factor_rested() {
        let three_days = (Utc::now() - Duration::hours(72)).format("%Y-%m-%d").to_string();
        let log = vec![entry(&three_days, "PHI", 1)];
        assert!((rest_factor(&game_starting_now(), &log) - 1.02).abs() < 1e-9);
    }

    #[test]
    fn test_rest_factor_bad_date() {
        let log = vec![entry("not-a-date", "PHI", 0)];
        assert_eq!(rest_factor(&game_starting_now(), &log), 1.0);
    }

    #[test]
    fn test_goalie_factor_bounds() {
        // League average: neutral-ish.
        assert!((goalie_factor(0.905) - 1.0).abs() < 1e-9);
        // Elite goalie lowers, weak goalie raises, both within clamps.
        assert!(goalie_factor(0.940) < 1.0);
        assert!(goalie_factor(0.860) > 1.0);
        assert!((goalie_factor(0.5) - 1.12).abs() < 1e-9);
        // Unknown or out-of-range stays neutral.
        assert_eq!(goalie_factor(0.0), 1.0);
        assert_eq!(goalie_factor(1.0), 1.0);
        assert_eq!(goalie_factor(-0.3), 1.0);
    }

    #[test]
    fn test_predict_heuristic_extremes_stay_bounded() {
        // Hot streak, terrible opponent, rested, weak goalie: ceiling holds.
        let today = Utc::now().date_naive();
        let log: Vec<GameLogEntry> = (0..82)
            .map(|i| {
                let date = today - chrono::Days::new((3 * (82 - i)) as u64);
                GameLogEntry {
                    game_id: i as i64,
                    game_date: date.format("%Y-%m-%d").to_string(),
                    opponent_abbrev: "PHI".into(),
                    home_road_flag: "H".into(),
                    goals: 3,
                }
            })
            .collect();
        let mut standings = HashMap::new();
        standings.insert(
            "PHI".to_string(),
            StandingsTeam {
                team_abbrev: "PHI".into(),
                games_played: 10,
                goal_against: 500,
                goal_for: 10,
                ..Default::default()
            },
        );
        let pct = predict_heuristic(&game_starting_now(), "WSH", &log, &standings, 0.5);
        assert_eq!(pct, 75);
    }
}
