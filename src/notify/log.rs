use async_trait::async_trait;

use super::{PublishError, Publisher};
use crate::format::NotificationMessage;

/// Dry-run sink: logs what would have been published.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

impl LogPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for LogPublisher {
    async fn send(&self, msg: &NotificationMessage) -> Result<Option<String>, PublishError> {
        tracing::info!(target: "notify", text = %msg.text(), "dry run - would publish");
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
