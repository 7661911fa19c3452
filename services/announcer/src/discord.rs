//! Discord REST client.
//!
//! Plain channel-message posting over the REST API; no gateway connection.
//! Message content is built by the formatters, this only ships it.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: Client,
    token: String,
    channel_id: String,
}

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    image: EmbedImage<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedImage<'a> {
    url: &'a str,
}

impl DiscordClient {
    pub fn new(token: String, channel_id: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            token,
            channel_id,
        }
    }

    pub async fn post_message(&self, content: &str) -> Result<()> {
        self.post(CreateMessage {
            content,
            embeds: Vec::new(),
        })
        .await
    }

    /// Message with an embedded image (goal announcements).
    pub async fn post_message_with_image(&self, content: &str, image_url: &str) -> Result<()> {
        self.post(CreateMessage {
            content,
            embeds: vec![Embed {
                image: EmbedImage { url: image_url },
            }],
        })
        .await
    }

    async fn post(&self, body: CreateMessage<'_>) -> Result<()> {
        let url = format!("{API_BASE}/channels/{}/messages", self.channel_id);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Discord API request failed: {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Discord API non-2xx: {status} body={text}");
        }
        Ok(())
    }
}
