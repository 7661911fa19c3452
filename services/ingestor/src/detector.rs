//! Goal detection tick.
//!
//! Each tick is a function of (scoreboard snapshot, persisted dedup state,
//! current known career total): the dedup set lives in Redis keyed by
//! (game id, goals-to-date) so restarts and multiple ingestors share it, and
//! the career total is threaded through explicitly rather than held as
//! ambient state. The official landing total lags live play, so detected
//! goals increment the tracked total directly and the landing value is only
//! used to reconcile upward between games.

use chrono::Utc;
use log::{info, warn};

use goalbot_core::clients::nhl::{NhlClient, ScoreGame, ScoreGoal};
use goalbot_core::config::SubjectConfig;
use goalbot_core::models::{is_in_progress_state, keys, GoalEvent};
use goalbot_core::redis::{cache, RedisBus};

use crate::config::PBP_RETRY_DELAY;

/// Goals by the subject in the scoreboard snapshot, in feed order.
pub fn subject_goals(game: &ScoreGame, player_id: i64) -> Vec<ScoreGoal> {
    game.goals
        .iter()
        .filter(|g| g.player_id == player_id)
        .copied()
        .collect()
}

pub async fn run_tick(
    nhl: &NhlClient,
    bus: &RedisBus,
    subject: &SubjectConfig,
    career_total: &mut i32,
) {
    let game = match nhl.score_now_game(&subject.team_abbrev).await {
        Ok(g) => g,
        Err(e) => {
            warn!("score/now fetch failed: {e}");
            return;
        }
    };

    let Some(game) = game else {
        // No subject game in the score window; reconcile with the landing
        // total so the next game starts from the authoritative count.
        reconcile_career_total(nhl, subject, career_total).await;
        return;
    };

    if !is_in_progress_state(&game.game_state) {
        reconcile_career_total(nhl, subject, career_total).await;
        return;
    }

    for goal in subject_goals(&game, subject.player_id) {
        match cache::mark_goal_seen(bus, game.game_id, goal.goals_to_date).await {
            Ok(true) => continue, // already emitted, here or by a peer
            Ok(false) => {}
            Err(e) => {
                warn!("mark goal seen failed: {e:#}");
                continue;
            }
        }

        *career_total += 1;
        let mut event = GoalEvent {
            player_id: subject.player_id,
            goals: *career_total,
            recorded_at: Utc::now(),
            opponent: None,
            opponent_name: None,
            goalie_name: None,
        };
        enrich_event(nhl, subject, &game, &goal, &mut event).await;

        match bus.emit(keys::GOALS_STREAM, &event).await {
            Ok(id) => info!(
                "goal event emitted: stream_id={id} goals={} game_id={} goals_to_date={}",
                event.goals, game.game_id, goal.goals_to_date
            ),
            Err(e) => warn!("emit goal event failed: goals={} error={e:#}", event.goals),
        }
    }
}

/// Best-effort enrichment: opponent from the boxscore, and the goalie who
/// was actually in net for this goal from play-by-play (the boxscore starter
/// may have been pulled). Play-by-play can lag the scoreboard by a few
/// seconds, so one bounded retry is allowed.
async fn enrich_event(
    nhl: &NhlClient,
    subject: &SubjectConfig,
    game: &ScoreGame,
    goal: &ScoreGoal,
    event: &mut GoalEvent,
) {
    let boxscore = match nhl.boxscore(game.game_id).await {
        Ok(b) => b,
        Err(e) => {
            warn!("boxscore fetch failed: game_id={} error={e}", game.game_id);
            None
        }
    };
    if let Some(b) = &boxscore {
        let (abbrev, name) = b.opponent_of(&subject.team_abbrev);
        event.opponent = Some(abbrev.to_string());
        if !name.is_empty() {
            event.opponent_name = Some(name.to_string());
        }
    }

    let mut goalie = nhl
        .goalie_for_goal(game.game_id, subject.player_id, goal.goals_to_date)
        .await
        .unwrap_or_else(|e| {
            warn!("play-by-play fetch failed: game_id={} error={e}", game.game_id);
            None
        });
    if goalie.is_none() {
        tokio::time::sleep(PBP_RETRY_DELAY).await;
        goalie = nhl
            .goalie_for_goal(game.game_id, subject.player_id, goal.goals_to_date)
            .await
            .unwrap_or(None);
    }
    event.goalie_name = goalie.or_else(|| {
        boxscore
            .as_ref()
            .and_then(|b| b.opposing_starter(&subject.team_abbrev))
            .map(|g| g.name.clone())
    });
}

/// The landing total only ever moves the tracked count forward; a lagging
/// API must not roll back goals we already announced.
async fn reconcile_career_total(nhl: &NhlClient, subject: &SubjectConfig, career_total: &mut i32) {
    match nhl.career_goals(subject.player_id).await {
        Ok(api_goals) if api_goals > *career_total => {
            info!("career total reconciled: {} -> {api_goals}", *career_total);
            *career_total = api_goals;
        }
        Ok(_) => {}
        Err(e) => warn!("career goals fetch failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_game(goals: Vec<ScoreGoal>) -> ScoreGame {
        ScoreGame {
            game_id: 5,
            game_state: "LIVE".into(),
            home_abbrev: "WSH".into(),
            away_abbrev: "NSH".into(),
            goals,
        }
    }

    #[test]
    fn test_subject_goals_filters_by_player() {
        let game = score_game(vec![
            ScoreGoal { player_id: 1, goals_to_date: 10 },
            ScoreGoal { player_id: 8471214, goals_to_date: 30 },
            ScoreGoal { player_id: 8471214, goals_to_date: 31 },
        ]);
        let goals = subject_goals(&game, 8471214);
        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].goals_to_date, 30);
        assert_eq!(goals[1].goals_to_date, 31);
    }

    #[test]
    fn test_subject_goals_none() {
        let game = score_game(vec![ScoreGoal { player_id: 1, goals_to_date: 2 }]);
        assert!(subject_goals(&game, 8471214).is_empty());
    }
}
