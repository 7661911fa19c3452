//! Message formatting for Discord.

use chrono::DateTime;
use chrono_tz::America::New_York;

use goalbot_core::models::{GoalEvent, PredictionPayload};

pub fn format_goal(event: &GoalEvent, subject_name: &str) -> String {
    let mut out = format!(
        "🚨 **GOAL!** {subject_name} has scored! Career goal **#{}**",
        event.goals
    );
    if let Some(opp) = event.opponent_name.as_ref().or(event.opponent.as_ref()) {
        out.push_str(&format!(" vs **{opp}**"));
    }
    if let Some(goalie) = &event.goalie_name {
        out.push_str(&format!("\n🥅 Beat goalie: **{goalie}**"));
    }
    out
}

pub fn format_reminder(payload: &PredictionPayload, subject_team: &str) -> String {
    let versus = if payload.home_away == "HOME" {
        format!("{} vs **{}**", subject_team, payload.opponent)
    } else {
        format!("{} @ **{}**", subject_team, payload.opponent)
    };
    let mut out = format!("⏰ **Game in ~1 hour:** {versus}");
    if let Some(when) = start_time_eastern(&payload.start_time_utc) {
        out.push_str(&format!("\n🕐 {when}"));
    }
    out.push_str(&format!(
        "\n📊 Scoring chance: **{}%**",
        payload.probability_pct
    ));
    if let Some(odds) = &payload.odds_american {
        out.push_str(&format!(" · Anytime goal: **{odds}**"));
    }
    if let Some(goalie) = &payload.goalie_name {
        out.push_str(&format!("\n🥅 Probable goalie: **{goalie}**"));
    }
    out
}

/// Render an RFC 3339 start time in Eastern Time, the league's scheduling
/// timezone; None when the stored string does not parse.
pub fn start_time_eastern(rfc3339: &str) -> Option<String> {
    let start = DateTime::parse_from_rfc3339(rfc3339).ok()?;
    let eastern = start.with_timezone(&New_York);
    Some(eastern.format("%a %b %-d, %-I:%M %p ET").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn payload() -> PredictionPayload {
        PredictionPayload {
            game_id: 2025020940,
            opponent: "PHI".into(),
            home_away: "HOME".into(),
            probability_pct: 55,
            start_time_utc: "2026-02-24T00:00:00Z".into(),
            game_date: "2026-02-23".into(),
            odds_american: Some("+140".into()),
            goalie_name: Some("S. Ersson".into()),
        }
    }

    #[test]
    fn test_format_goal_full() {
        let event = GoalEvent {
            player_id: 8471214,
            goals: 900,
            recorded_at: Utc::now(),
            opponent: Some("NSH".into()),
            opponent_name: Some("Predators".into()),
            goalie_name: Some("J. Annunen".into()),
        };
        let msg = format_goal(&event, "Alex Ovechkin");
        assert!(msg.contains("#900"));
        assert!(msg.contains("**Predators**"));
        assert!(msg.contains("**J. Annunen**"));
    }

    #[test]
    fn test_format_goal_minimal() {
        let event = GoalEvent {
            player_id: 8471214,
            goals: 901,
            recorded_at: Utc::now(),
            opponent: None,
            opponent_name: None,
            goalie_name: None,
        };
        let msg = format_goal(&event, "Alex Ovechkin");
        assert!(msg.contains("#901"));
        assert!(!msg.contains("vs"));
        assert!(!msg.contains("goalie"));
    }

    #[test]
    fn test_format_reminder_home() {
        let msg = format_reminder(&payload(), "WSH");
        assert!(msg.contains("WSH vs **PHI**"));
        assert!(msg.contains("**55%**"));
        assert!(msg.contains("+140"));
        assert!(msg.contains("S. Ersson"));
        // 2026-02-24 00:00 UTC is the evening of Feb 23 in Eastern Time.
        assert!(msg.contains("Feb 23"));
        assert!(msg.contains("PM ET"));
    }

    #[test]
    fn test_format_reminder_away_without_extras() {
        let mut p = payload();
        p.home_away = "AWAY".into();
        p.odds_american = None;
        p.goalie_name = None;
        let msg = format_reminder(&p, "WSH");
        assert!(msg.contains("WSH @ **PHI**"));
        assert!(!msg.contains("Anytime goal"));
        assert!(!msg.contains("goalie"));
    }

    #[test]
    fn test_start_time_eastern_invalid() {
        assert!(start_time_eastern("not-a-time").is_none());
        assert!(start_time_eastern("").is_none());
    }
}
