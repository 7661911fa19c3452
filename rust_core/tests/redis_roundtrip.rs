//! Redis-backed invariants: goal dedup, reminder idempotency, calibration
//! log bounds. These need a running Redis (REDIS_URL or localhost default);
//! run with `cargo test -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use goalbot_core::models::CalibrationSample;
use goalbot_core::redis::{cache, RedisBus};

/// Unique-enough id so repeated test runs never collide on keys.
fn fresh_game_id() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch");
    now.as_nanos() as i64 & 0x7fff_ffff_ffff
}

#[tokio::test]
#[ignore] // Requires a running Redis
async fn goal_dedup_emits_once() {
    let bus = RedisBus::connect().await.expect("redis");
    let game_id = fresh_game_id();

    // First sighting of (game, goals-to-date) is new; the second is a
    // duplicate and must not produce another event.
    assert!(!cache::mark_goal_seen(&bus, game_id, 30).await.unwrap());
    assert!(cache::mark_goal_seen(&bus, game_id, 30).await.unwrap());

    // A different running total in the same game is a new goal.
    assert!(!cache::mark_goal_seen(&bus, game_id, 31).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires a running Redis
async fn reminder_marker_is_idempotent() {
    let bus = RedisBus::connect().await.expect("redis");
    let game_id = fresh_game_id();

    assert!(!cache::reminder_already_sent(&bus, game_id).await.unwrap());
    cache::mark_reminder_sent(&bus, game_id).await.unwrap();
    assert!(cache::reminder_already_sent(&bus, game_id).await.unwrap());
    // Marking again does not error and the game stays sent.
    cache::mark_reminder_sent(&bus, game_id).await.unwrap();
    assert!(cache::reminder_already_sent(&bus, game_id).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires a running Redis
async fn calibration_log_is_bounded() {
    let bus = RedisBus::connect().await.expect("redis");

    for i in 0..120 {
        let sample = CalibrationSample {
            pred_pct: 40 + (i % 20),
            scored: i32::from(i % 2 == 0),
        };
        cache::append_calibration_sample(&bus, &sample).await.unwrap();
    }
    let samples = cache::read_calibration_samples(&bus).await.unwrap();
    assert!(samples.len() <= 100, "got {}", samples.len());
    assert!(!samples.is_empty());
}
