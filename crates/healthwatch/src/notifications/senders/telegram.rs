use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{ChannelSender, SenderError, ensure_success, wrong_settings};
use crate::models::{AlertChannelConfig, ChannelKind, ChannelSettings};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Pushes messages through the Telegram Bot API
pub struct TelegramSender {
    client: Client,
}

impl TelegramSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Escape text for Telegram MarkdownV2.
fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}' | '.' | '!'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[async_trait]
impl ChannelSender for TelegramSender {
    async fn send(&self, config: &AlertChannelConfig, message: &str) -> Result<(), SenderError> {
        let ChannelSettings::Telegram { bot_token, chat_id, api_base } = &config.settings else {
            return Err(wrong_settings(ChannelKind::Telegram, config));
        };

        let base = api_base.as_deref().unwrap_or(DEFAULT_API_BASE).trim_end_matches('/');
        let url = format!("{base}/bot{bot_token}/sendMessage");
        let text = escape_markdown_v2(message);
        let payload = TelegramMessage { chat_id, text: &text, parse_mode: "MarkdownV2" };

        let response = self.client.post(&url).json(&payload).send().await?;
        ensure_success(response).await
    }
}
