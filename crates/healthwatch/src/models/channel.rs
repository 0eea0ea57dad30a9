use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport used by a notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Telegram,
    Discord,
    Slack,
    Webhook,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Discord => "discord",
            ChannelKind::Slack => "slack",
            ChannelKind::Webhook => "webhook",
        };
        f.write_str(name)
    }
}

/// Transport specific credentials.
///
/// Stored as tagged JSON, e.g. `{"type":"telegram","bot_token":"..","chat_id":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelSettings {
    Telegram {
        bot_token: String,
        chat_id: String,
        /// Overrides `https://api.telegram.org`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_base: Option<String>,
    },
    Discord {
        webhook_url: String,
    },
    Slack {
        webhook_url: String,
    },
    Webhook {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<HashMap<String, String>>,
    },
}

impl ChannelSettings {
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelSettings::Telegram { .. } => ChannelKind::Telegram,
            ChannelSettings::Discord { .. } => ChannelKind::Discord,
            ChannelSettings::Slack { .. } => ChannelKind::Slack,
            ChannelSettings::Webhook { .. } => ChannelKind::Webhook,
        }
    }
}

/// External notification target, read-only to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertChannelConfig {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub settings: ChannelSettings,
}

impl AlertChannelConfig {
    pub fn kind(&self) -> ChannelKind {
        self.settings.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_are_tagged_by_transport() {
        let raw = r#"{"type":"telegram","bot_token":"123:abc","chat_id":"-100"}"#;
        let settings: ChannelSettings = serde_json::from_str(raw).unwrap();

        assert_eq!(settings.kind(), ChannelKind::Telegram);
        assert!(matches!(settings, ChannelSettings::Telegram { api_base: None, .. }));
    }

    #[test]
    fn webhook_headers_are_optional() {
        let settings: ChannelSettings =
            serde_json::from_str(r#"{"type":"webhook","url":"https://hooks.example.com/x"}"#).unwrap();
        assert_eq!(settings, ChannelSettings::Webhook { url: "https://hooks.example.com/x".into(), headers: None });
    }
}
