//! Announcer configuration.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Empty disables Discord posting; events are still consumed and logged.
    pub discord_token: String,
    pub announce_channel_id: String,
    /// Optional image attached to goal announcements.
    pub image_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            discord_token: env::var("DISCORD_BOT_TOKEN").unwrap_or_default(),
            announce_channel_id: env::var("DISCORD_ANNOUNCE_CHANNEL_ID").unwrap_or_default(),
            image_url: env::var("DISCORD_GOAL_IMAGE_URL").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn discord_enabled(&self) -> bool {
        !self.discord_token.is_empty() && !self.announce_channel_id.is_empty()
    }
}
