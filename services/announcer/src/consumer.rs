//! Stream consumption via consumer groups.
//!
//! All three streams share one group name; delivery is at-least-once with
//! explicit acknowledgment after handling, and payloads that fail to parse
//! are acked away rather than redelivered forever.

use anyhow::Result;
use log::warn;
use serde::de::DeserializeOwned;

use goalbot_core::models::{keys, GoalEvent, PostGamePayload, PredictionPayload};
use goalbot_core::redis::RedisBus;

pub const CONSUMER_GROUP: &str = "announcers";
pub const CONSUMER_NAME: &str = "announcer-1";
const READ_COUNT: usize = 10;
const READ_BLOCK_MS: usize = 5000;

/// Create the consumer groups for all three streams (MKSTREAM, BUSYGROUP
/// tolerated).
pub async fn ensure_groups(bus: &RedisBus) -> Result<()> {
    bus.ensure_group(keys::GOALS_STREAM, CONSUMER_GROUP).await?;
    bus.ensure_group(keys::REMINDERS_STREAM, CONSUMER_GROUP).await?;
    bus.ensure_group(keys::POST_GAME_STREAM, CONSUMER_GROUP).await?;
    Ok(())
}

pub async fn read_goal_events(bus: &RedisBus) -> Result<(Vec<GoalEvent>, Vec<String>)> {
    read_typed(bus, keys::GOALS_STREAM).await
}

pub async fn read_reminders(bus: &RedisBus) -> Result<(Vec<PredictionPayload>, Vec<String>)> {
    read_typed(bus, keys::REMINDERS_STREAM).await
}

pub async fn read_post_games(bus: &RedisBus) -> Result<(Vec<PostGamePayload>, Vec<String>)> {
    read_typed(bus, keys::POST_GAME_STREAM).await
}

pub async fn ack(bus: &RedisBus, stream: &str, ids: &[String]) -> Result<()> {
    bus.ack(stream, CONSUMER_GROUP, ids).await
}

/// Blocking read of new messages; returns parsed payloads and all read ids
/// (unparseable entries are still acked via the id list).
async fn read_typed<T: DeserializeOwned>(
    bus: &RedisBus,
    stream: &str,
) -> Result<(Vec<T>, Vec<String>)> {
    let entries = bus
        .read_group(stream, CONSUMER_GROUP, CONSUMER_NAME, READ_COUNT, READ_BLOCK_MS)
        .await?;
    let mut payloads = Vec::with_capacity(entries.len());
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        ids.push(entry.id.clone());
        match serde_json::from_str(&entry.payload) {
            Ok(p) => payloads.push(p),
            Err(e) => warn!("skipping invalid payload: stream={stream} id={} error={e}", entry.id),
        }
    }
    Ok((payloads, ids))
}
