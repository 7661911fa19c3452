//! Announcer service.
//!
//! Consumes the goal, reminder and post-game streams through consumer groups
//! and relays formatted messages to a Discord channel over the REST API.
//! Without a bot token the loops still drain and log the streams so the
//! groups do not back up.

mod config;
mod consumer;
mod discord;
mod formatters;

use std::time::Duration;

use anyhow::Result;
use dotenv::dotenv;
use log::{error, info, warn};

use goalbot_core::config::SubjectConfig;
use goalbot_core::models::keys;
use goalbot_core::redis::RedisBus;

use config::Config;
use discord::DiscordClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cfg = Config::from_env();
    let subject = SubjectConfig::from_env();

    let bus = match RedisBus::connect().await {
        Ok(bus) => bus,
        Err(e) => {
            error!("redis connect failed: {e:#}");
            std::process::exit(1);
        }
    };
    if let Err(e) = consumer::ensure_groups(&bus).await {
        warn!("consumer group ensure failed: {e:#}");
    }

    let discord = if cfg.discord_enabled() {
        Some(DiscordClient::new(
            cfg.discord_token.clone(),
            cfg.announce_channel_id.clone(),
        ))
    } else {
        info!("DISCORD_BOT_TOKEN not set; Discord announcements disabled");
        None
    };
    info!(
        "announcer started: stream={} group={}",
        keys::GOALS_STREAM,
        consumer::CONSUMER_GROUP
    );

    // Reminders and post-game summaries drain on their own tasks; goal
    // events stay on the main loop.
    {
        let bus = bus.clone();
        let discord = discord.clone();
        tokio::spawn(async move { reminder_loop(bus, discord).await });
    }
    {
        let bus = bus.clone();
        let discord = discord.clone();
        tokio::spawn(async move { post_game_loop(bus, discord).await });
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("announcer shutting down");
                return Ok(());
            }
            read = consumer::read_goal_events(&bus) => {
                let (events, ids) = match read {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("read goal events failed: {e:#}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };
                for event in &events {
                    info!(
                        "goal notification: player_id={} goals={} goalie={:?}",
                        event.player_id, event.goals, event.goalie_name
                    );
                    if let Some(client) = &discord {
                        let content = formatters::format_goal(event, &subject.player_name);
                        let posted = match &cfg.image_url {
                            Some(url) => client.post_message_with_image(&content, url).await,
                            None => client.post_message(&content).await,
                        };
                        if let Err(e) = posted {
                            warn!("discord goal post failed: {e:#}");
                        }
                    }
                }
                if let Err(e) = consumer::ack(&bus, keys::GOALS_STREAM, &ids).await {
                    warn!("goal ack failed: {e:#}");
                }
            }
        }
    }
}

async fn reminder_loop(bus: RedisBus, discord: Option<DiscordClient>) {
    let subject = SubjectConfig::from_env();
    loop {
        let (payloads, ids) = match consumer::read_reminders(&bus).await {
            Ok(r) => r,
            Err(e) => {
                warn!("read reminders failed: {e:#}");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        for payload in &payloads {
            info!(
                "reminder: game_id={} opponent={} probability_pct={}",
                payload.game_id, payload.opponent, payload.probability_pct
            );
            if let Some(client) = &discord {
                let content = formatters::format_reminder(payload, &subject.team_abbrev);
                if let Err(e) = client.post_message(&content).await {
                    warn!("discord reminder post failed: {e:#}");
                }
            }
        }
        if let Err(e) = consumer::ack(&bus, keys::REMINDERS_STREAM, &ids).await {
            warn!("reminder ack failed: {e:#}");
        }
    }
}

async fn post_game_loop(bus: RedisBus, discord: Option<DiscordClient>) {
    loop {
        let (payloads, ids) = match consumer::read_post_games(&bus).await {
            Ok(r) => r,
            Err(e) => {
                warn!("read post-game failed: {e:#}");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        for payload in &payloads {
            info!("post-game summary received");
            if let Some(client) = &discord {
                if let Err(e) = client.post_message(&payload.message).await {
                    warn!("discord post-game send failed: {e:#}");
                }
            }
        }
        if let Err(e) = consumer::ack(&bus, keys::POST_GAME_STREAM, &ids).await {
            warn!("post-game ack failed: {e:#}");
        }
    }
}
