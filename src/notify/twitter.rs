use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{OAuth1Credentials, PublishError, Publisher};
use crate::format::NotificationMessage;

const DEFAULT_ENDPOINT: &str = "https://api.twitter.com/2/tweets";

/// Posts to X through the v2 `POST /2/tweets` endpoint, signed with OAuth 1.0a
/// user-context credentials.
#[derive(Clone)]
pub struct TwitterPublisher {
    endpoint: String,
    creds: OAuth1Credentials,
    client: Client,
    timeout: Duration,
    max_chars: usize,
}

impl TwitterPublisher {
    pub fn new(creds: OAuth1Credentials) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            creds,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_chars: 280,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_max_chars(mut self, max: usize) -> Self {
        self.max_chars = max;
        self
    }

    /// Alternate API host (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fresh `Authorization` value for one create-tweet call.
    fn authorization(&self) -> Result<String, PublishError> {
        self.creds.authorization("POST", &self.endpoint, &[])
    }
}

#[derive(Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: Option<TweetData>,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[async_trait]
impl Publisher for TwitterPublisher {
    async fn send(&self, msg: &NotificationMessage) -> Result<Option<String>, PublishError> {
        // Over-limit text never leaves the process.
        let len = msg.char_count();
        if len > self.max_chars {
            return Err(PublishError::TooLong {
                len,
                max: self.max_chars,
            });
        }

        let text = msg.text();
        let rsp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .json(&CreateTweet { text: &text })
            .send()
            .await?;

        let status = rsp.status();
        let body = rsp.text().await?;
        if !status.is_success() {
            return Err(PublishError::from_status(status.as_u16(), &body));
        }

        let parsed: CreateTweetResponse = serde_json::from_str(&body)
            .map_err(|e| PublishError::Transport(format!("unreadable create-tweet response: {e}")))?;
        Ok(parsed.data.map(|d| d.id))
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Subject;
    use crate::format::NotificationFormatter;
    use chrono::Utc;

    fn creds() -> OAuth1Credentials {
        OAuth1Credentials::new("app-key", "app-secret", "user-token", "user-secret")
    }

    #[test]
    fn authorization_is_signed_with_configured_keys() {
        let p = TwitterPublisher::new(creds());
        let header = p.authorization().unwrap();
        assert!(header.starts_with("OAuth "), "{header}");
        assert!(header.contains(r#"oauth_consumer_key="app-key""#));
        assert!(header.contains(r#"oauth_token="user-token""#));
        assert!(header.contains(r#"oauth_signature_method="HMAC-SHA1""#));
        assert!(!header.contains("Bearer"));
        assert!(!header.contains("app-secret"));
    }

    #[tokio::test]
    async fn overlong_message_fails_without_network() {
        // Unroutable endpoint: reaching the network would be a transport error.
        let p = TwitterPublisher::new(creds())
            .with_endpoint("http://127.0.0.1:9/2/tweets")
            .with_max_chars(10);
        let msg = NotificationFormatter::new(&Subject::default()).announcement(Utc::now());
        match p.send(&msg).await {
            Err(PublishError::TooLong { max, .. }) => assert_eq!(max, 10),
            other => panic!("expected TooLong, got {other:?}"),
        }
    }
}
