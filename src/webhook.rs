use reqwest::Client;
use serde_json::json;
use std::error::Error;

/// Client for a Slack-style incoming webhook.
///
/// This is the transport behind the `important` side channel: a single
/// `POST <url>` with body `{"text": "<message>"}`. No retry, no timeout
/// override beyond the transport default, no delivery confirmation.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        WebhookClient {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Perform one webhook POST.
    ///
    /// **Returns**
    /// - `Ok(())` on any 2xx response.
    /// - `Err(..)` on a network failure or non-success status. The caller
    ///   (a detached delivery task) converts this into a single `warn`
    ///   record and drops it.
    pub async fn post(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("webhook POST failed with status {}: {}", status, body).into())
        }
    }
}
