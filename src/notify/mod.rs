//! Publishing sinks for formatted messages.
//!
//! Every sink gets exactly one attempt per message. Any failure, whatever
//! its reason, is reported as "not published" and never retried.

pub mod discord;
pub mod log;
pub mod oauth1;
pub mod slack;
pub mod twitter;

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::{PublisherConfig, PublisherKind};
use crate::format::NotificationMessage;

pub use discord::DiscordPublisher;
pub use log::LogPublisher;
pub use oauth1::OAuth1Credentials;
pub use slack::SlackPublisher;
pub use twitter::TwitterPublisher;

/// Why a sink did not accept a message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Network failure, timeout, unreadable response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("message too long: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("rate limited by sink")]
    RateLimited,

    #[error("sink rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("sink rejected message (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    #[error("request signing failed: {0}")]
    Signing(String),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        PublishError::Transport(e.to_string())
    }
}

impl PublishError {
    /// Map a non-2xx HTTP status to the matching rejection.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => PublishError::Unauthorized { status },
            429 => PublishError::RateLimited,
            _ => PublishError::Rejected {
                status,
                reason: body.chars().take(200).collect(),
            },
        }
    }
}

/// Result of one publish attempt as seen by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub success: bool,
    /// Sink-assigned id (tweet id, Discord message id), when the sink returns one.
    pub external_id: Option<String>,
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// One network call. `Ok(id)` on acceptance.
    async fn send(&self, msg: &NotificationMessage) -> Result<Option<String>, PublishError>;

    fn name(&self) -> &'static str;

    /// `send` with failures logged and folded into the outcome.
    async fn publish(&self, msg: &NotificationMessage) -> PublishOutcome {
        match self.send(msg).await {
            Ok(external_id) => {
                tracing::info!(
                    target: "notify",
                    sink = self.name(),
                    id = external_id.as_deref().unwrap_or("-"),
                    "message published"
                );
                PublishOutcome {
                    success: true,
                    external_id,
                }
            }
            Err(e) => {
                tracing::warn!(target: "notify", sink = self.name(), error = %e, "publish failed");
                PublishOutcome {
                    success: false,
                    external_id: None,
                }
            }
        }
    }
}

/// Build the configured sink. Secrets are expected to be resolved already.
pub fn build_publisher(cfg: &PublisherConfig) -> Result<Arc<dyn Publisher>> {
    let publisher: Arc<dyn Publisher> = match cfg.kind {
        PublisherKind::Log => Arc::new(LogPublisher::new()),
        PublisherKind::Twitter => {
            let creds = cfg
                .twitter_credentials()
                .context("twitter publisher needs api_key, api_secret, access_token and access_token_secret")?;
            Arc::new(
                TwitterPublisher::new(creds)
                    .with_timeout(cfg.timeout_secs)
                    .with_max_chars(cfg.max_chars),
            )
        }
        PublisherKind::Discord => {
            let url = cfg
                .webhook_url
                .clone()
                .context("discord publisher needs a webhook_url")?;
            Arc::new(DiscordPublisher::new(url).with_timeout(cfg.timeout_secs))
        }
        PublisherKind::Slack => {
            let url = cfg
                .webhook_url
                .clone()
                .context("slack publisher needs a webhook_url")?;
            Arc::new(SlackPublisher::new(url).with_timeout(cfg.timeout_secs))
        }
    };
    Ok(publisher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            PublishError::from_status(401, ""),
            PublishError::Unauthorized { status: 401 }
        ));
        assert!(matches!(
            PublishError::from_status(429, "slow down"),
            PublishError::RateLimited
        ));
        match PublishError::from_status(400, "duplicate content") {
            PublishError::Rejected { status, reason } => {
                assert_eq!(status, 400);
                assert_eq!(reason, "duplicate content");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_secret_is_a_build_error() {
        let cfg = PublisherConfig {
            kind: PublisherKind::Twitter,
            ..Default::default()
        };
        assert!(build_publisher(&cfg).is_err());

        let cfg = PublisherConfig::default();
        assert_eq!(build_publisher(&cfg).unwrap().name(), "log");
    }
}
