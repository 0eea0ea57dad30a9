use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::json;

use super::{ChannelSender, SenderError, ensure_success, wrong_settings};
use crate::models::{AlertChannelConfig, ChannelKind, ChannelSettings};

/// Generic JSON webhook: `POST {"channel": .., "message": ..}` with optional headers
pub struct WebhookSender {
    client: Client,
}

impl WebhookSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelSender for WebhookSender {
    async fn send(&self, config: &AlertChannelConfig, message: &str) -> Result<(), SenderError> {
        let ChannelSettings::Webhook { url, headers } = &config.settings else {
            return Err(wrong_settings(ChannelKind::Webhook, config));
        };

        let mut request = self.client.post(url).json(&json!({ "channel": config.name, "message": message }));

        if let Some(headers) = headers {
            let mut header_map = header::HeaderMap::new();
            for (key, value) in headers {
                let name = header::HeaderName::from_bytes(key.as_bytes())
                    .map_err(|e| SenderError::InvalidConfiguration(format!("invalid header name {key}: {e}")))?;
                let value = header::HeaderValue::from_str(value)
                    .map_err(|e| SenderError::InvalidConfiguration(format!("invalid header value for {key}: {e}")))?;
                header_map.insert(name, value);
            }
            request = request.headers(header_map);
        }

        let response = request.send().await?;
        ensure_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockito::Matcher;

    use super::*;

    #[tokio::test]
    async fn sends_message_with_custom_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks/alerts")
            .match_header("x-api-key", "secret")
            .match_body(Matcher::PartialJson(json!({ "message": "Web is DOWN" })))
            .with_status(202)
            .create_async()
            .await;

        let config = AlertChannelConfig {
            id: "hook".into(),
            name: "Pager".into(),
            enabled: true,
            settings: ChannelSettings::Webhook {
                url: format!("{}/hooks/alerts", server.url()),
                headers: Some(HashMap::from([("x-api-key".to_string(), "secret".to_string())])),
            },
        };

        WebhookSender::new(Client::new()).send(&config, "Web is DOWN").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn mismatched_settings_are_rejected_without_a_request() {
        let config = AlertChannelConfig {
            id: "slack".into(),
            name: "Slack".into(),
            enabled: true,
            settings: ChannelSettings::Slack { webhook_url: "http://127.0.0.1:1/".into() },
        };

        let err = WebhookSender::new(Client::new()).send(&config, "hi").await.unwrap_err();
        assert!(matches!(err, SenderError::InvalidConfiguration(_)));
    }
}
