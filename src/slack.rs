use crate::config::SlackApiSettings;
use crate::sink::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::error::Error;

/// Default Slack Web API endpoint for posting messages.
pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Slack API implementation of [`Notifier`] using `chat.postMessage`.
///
/// Wired into the backend when both `SLACK_TOKEN` and `SLACK_CHANNEL_ID`
/// are configured; receives every error-level record.
#[derive(Clone)]
pub struct SlackApiNotifier {
    client: Client,
    settings: SlackApiSettings,
    api_url: String,
}

impl SlackApiNotifier {
    pub fn new(settings: SlackApiSettings) -> Self {
        SlackApiNotifier {
            client: Client::new(),
            settings,
            api_url: SLACK_POST_MESSAGE_URL.to_string(),
        }
    }

    /// Override the API endpoint. Intended for tests that stand in for
    /// the Slack Web API with a local server.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait]
impl Notifier for SlackApiNotifier {
    async fn notify(&self, message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let payload = json!({
            "channel": self.settings.channel_id,
            "username": self.settings.username,
            "text": message,
        });

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.settings.token)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(format!("Slack API responded with status {}: {}", status, text).into());
        }

        // Slack reports application-level failures as 200 + `"ok": false`.
        let body: Value = resp.json().await?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(format!("Slack API rejected the message: {}", reason).into());
        }

        Ok(())
    }
}
