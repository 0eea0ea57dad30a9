use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ChannelSender, SenderError, ensure_success, wrong_settings};
use crate::models::{AlertChannelConfig, ChannelKind, ChannelSettings};

/// Posts to a Slack incoming webhook
pub struct SlackSender {
    client: Client,
}

impl SlackSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelSender for SlackSender {
    async fn send(&self, config: &AlertChannelConfig, message: &str) -> Result<(), SenderError> {
        let ChannelSettings::Slack { webhook_url } = &config.settings else {
            return Err(wrong_settings(ChannelKind::Slack, config));
        };

        let response = self.client.post(webhook_url).json(&json!({ "text": message })).send().await?;
        ensure_success(response).await
    }
}
