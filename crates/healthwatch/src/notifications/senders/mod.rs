use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

use crate::models::{AlertChannelConfig, ChannelKind};

pub mod discord;
pub mod slack;
pub mod telegram;
pub mod webhook;

pub use discord::DiscordSender;
pub use slack::SlackSender;
pub use telegram::TelegramSender;
pub use webhook::WebhookSender;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("channel rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One notification transport.
///
/// Implementations make exactly one request per call; retry policy belongs
/// to the dispatcher deciding whether to call at all.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, config: &AlertChannelConfig, message: &str) -> Result<(), SenderError>;
}

/// Senders for every built-in transport, sharing one HTTP client
pub fn default_senders(client: Client) -> HashMap<ChannelKind, Arc<dyn ChannelSender>> {
    let mut senders: HashMap<ChannelKind, Arc<dyn ChannelSender>> = HashMap::new();
    senders.insert(ChannelKind::Telegram, Arc::new(TelegramSender::new(client.clone())));
    senders.insert(ChannelKind::Discord, Arc::new(DiscordSender::new(client.clone())));
    senders.insert(ChannelKind::Slack, Arc::new(SlackSender::new(client.clone())));
    senders.insert(ChannelKind::Webhook, Arc::new(WebhookSender::new(client)));
    senders
}

/// Turn a non-2xx response into [`SenderError::Rejected`]
pub(crate) async fn ensure_success(response: Response) -> Result<(), SenderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_else(|_| "failed to read error body".to_string());
    Err(SenderError::Rejected { status: status.as_u16(), body })
}

pub(crate) fn wrong_settings(expected: ChannelKind, config: &AlertChannelConfig) -> SenderError {
    SenderError::InvalidConfiguration(format!("expected {expected} settings, found {}", config.kind()))
}
