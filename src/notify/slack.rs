use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{PublishError, Publisher};
use crate::format::NotificationMessage;

/// Slack incoming webhook. Slack answers `ok` and no message id.
pub struct SlackPublisher {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackPublisher {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl Publisher for SlackPublisher {
    async fn send(&self, msg: &NotificationMessage) -> Result<Option<String>, PublishError> {
        let body = serde_json::json!({ "text": msg.text() });

        let rsp = self
            .client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            let text = rsp.text().await.unwrap_or_default();
            return Err(PublishError::from_status(status.as_u16(), &text));
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
