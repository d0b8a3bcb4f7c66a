use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{PublishError, Publisher};
use crate::format::NotificationMessage;

/// Discord caps plain message content at 2000 characters.
const DISCORD_MAX_CHARS: usize = 2000;

#[derive(Clone)]
pub struct DiscordPublisher {
    webhook: String,
    client: Client,
    timeout: Duration,
}

impl DiscordPublisher {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Serialize)]
struct DiscordWebhookPayload<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct DiscordMessage {
    id: Option<String>,
}

#[async_trait]
impl Publisher for DiscordPublisher {
    async fn send(&self, msg: &NotificationMessage) -> Result<Option<String>, PublishError> {
        let len = msg.char_count();
        if len > DISCORD_MAX_CHARS {
            return Err(PublishError::TooLong {
                len,
                max: DISCORD_MAX_CHARS,
            });
        }

        let text = msg.text();
        // wait=true makes Discord answer with the created message (and its id).
        let rsp = self
            .client
            .post(&self.webhook)
            .query(&[("wait", "true")])
            .timeout(self.timeout)
            .json(&DiscordWebhookPayload { content: &text })
            .send()
            .await?;

        let status = rsp.status();
        let body = rsp.text().await?;
        if !status.is_success() {
            return Err(PublishError::from_status(status.as_u16(), &body));
        }
        // A 2xx without a readable body still means the message went out.
        Ok(serde_json::from_str::<DiscordMessage>(&body)
            .ok()
            .and_then(|m| m.id))
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}
