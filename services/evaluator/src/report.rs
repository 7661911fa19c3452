//! Post-game evaluation logic.
//!
//! Pure: given the finished game, the subject's boxscore line and the
//! prediction snapshot (when one exists), produce the hit/miss verdict, the
//! summary message and the calibration sample.

use goalbot_core::clients::nhl::SkaterLine;
use goalbot_core::models::{CalibrationSample, Game, PredictionPayload};

/// A prediction "hits" when it said 50%+ and the subject scored, or said
/// under 50% and the subject did not. This conflates calibration with
/// classification, but it is the signal the post-game message reports.
pub fn prediction_hit(pred_pct: i32, scored: bool) -> bool {
    (pred_pct >= 50 && scored) || (pred_pct < 50 && !scored)
}

/// Calibration sample for the predictor's scale computation; None without a
/// snapshot, since there is no predicted percentage to calibrate against.
pub fn calibration_sample(snapshot: Option<&PredictionPayload>, scored: bool) -> Option<CalibrationSample> {
    snapshot.map(|snap| CalibrationSample {
        pred_pct: snap.probability_pct,
        scored: i32::from(scored),
    })
}

/// The post-game summary the announcer relays verbatim.
pub fn format_summary(
    game: &Game,
    subject_team: &str,
    subject_name: &str,
    stats: &SkaterLine,
    snapshot: Option<&PredictionPayload>,
) -> String {
    let scored = stats.goals > 0;
    let mut msg = format!(
        "**Post-game evaluation** · {} vs **{}**\n",
        game.game_date,
        game.opponent(subject_team)
    );
    msg.push_str(&format!(
        "**{}:** {}G, {}A, {} PTS · TOI {} · {} shifts · {} SOG\n",
        subject_name, stats.goals, stats.assists, stats.points, stats.toi, stats.shifts, stats.sog
    ));
    match snapshot {
        Some(snap) if snap.probability_pct > 0 => {
            let hit = prediction_hit(snap.probability_pct, scored);
            let result = if hit { "Hit" } else { "Miss" };
            let actual = if scored { "scored" } else { "no goal" };
            msg.push_str(&format!(
                "**Prediction:** {}% · Actual: {} · **{}**",
                snap.probability_pct, actual, result
            ));
            if let Some(odds) = &snap.odds_american {
                msg.push_str(&format!(" · Odds had: {odds}"));
            }
            if let Some(goalie) = &snap.goalie_name {
                msg.push_str(&format!(" · Goalie: {goalie}"));
            }
            msg.push('\n');
        }
        _ => msg.push_str("_(No prediction snapshot for this game)_\n"),
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn game() -> Game {
        Game {
            game_id: 2025020900,
            home_abbrev: "WSH".into(),
            away_abbrev: "NSH".into(),
            start_time_utc: Utc::now(),
            game_state: "OFF".into(),
            game_date: "2026-02-05".into(),
            venue: String::new(),
        }
    }

    fn stats(goals: i32) -> SkaterLine {
        SkaterLine {
            player_id: 8471214,
            goals,
            assists: 1,
            points: goals + 1,
            toi: "18:45".into(),
            shifts: 20,
            sog: 4,
        }
    }

    fn snapshot(pct: i32) -> PredictionPayload {
        PredictionPayload {
            game_id: 2025020900,
            opponent: "NSH".into(),
            home_away: "HOME".into(),
            probability_pct: pct,
            start_time_utc: String::new(),
            game_date: "2026-02-05".into(),
            odds_american: Some("+140".into()),
            goalie_name: Some("J. Annunen".into()),
        }
    }

    #[test]
    fn test_prediction_hit_quadrants() {
        assert!(prediction_hit(60, true));
        assert!(prediction_hit(40, false));
        assert!(!prediction_hit(60, false));
        assert!(!prediction_hit(40, true));
        // Boundary: exactly 50 counts as a "scores" call.
        assert!(prediction_hit(50, true));
        assert!(!prediction_hit(50, false));
    }

    #[test]
    fn test_calibration_sample_requires_snapshot() {
        assert!(calibration_sample(None, true).is_none());
        let snap = snapshot(55);
        let sample = calibration_sample(Some(&snap), true).unwrap();
        assert_eq!(sample.pred_pct, 55);
        assert_eq!(sample.scored, 1);
        let sample = calibration_sample(Some(&snap), false).unwrap();
        assert_eq!(sample.scored, 0);
    }

    #[test]
    fn test_format_summary_with_snapshot() {
        let msg = format_summary(&game(), "WSH", "Alex Ovechkin", &stats(1), Some(&snapshot(55)));
        assert!(msg.contains("2026-02-05"));
        assert!(msg.contains("**NSH**"));
        assert!(msg.contains("1G, 1A, 2 PTS"));
        assert!(msg.contains("55%"));
        assert!(msg.contains("**Hit**"));
        assert!(msg.contains("Odds had: +140"));
        assert!(msg.contains("Goalie: J. Annunen"));
    }

    #[test]
    fn test_format_summary_miss() {
        let msg = format_summary(&game(), "WSH", "Alex Ovechkin", &stats(0), Some(&snapshot(55)));
        assert!(msg.contains("no goal"));
        assert!(msg.contains("**Miss**"));
    }

    #[test]
    fn test_format_summary_without_snapshot() {
        let msg = format_summary(&game(), "WSH", "Alex Ovechkin", &stats(0), None);
        assert!(msg.contains("No prediction snapshot"));
        assert!(!msg.contains("Prediction:"));
    }
}
