use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ChannelSender, SenderError, ensure_success, wrong_settings};
use crate::models::{AlertChannelConfig, ChannelKind, ChannelSettings};

/// Posts to a Discord incoming webhook
pub struct DiscordSender {
    client: Client,
}

impl DiscordSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelSender for DiscordSender {
    async fn send(&self, config: &AlertChannelConfig, message: &str) -> Result<(), SenderError> {
        let ChannelSettings::Discord { webhook_url } = &config.settings else {
            return Err(wrong_settings(ChannelKind::Discord, config));
        };

        let response = self.client.post(webhook_url).json(&json!({ "content": message })).send().await?;
        ensure_success(response).await
    }
}
