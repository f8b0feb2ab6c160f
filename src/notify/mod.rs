//! Notification channel.
//!
//! The core hands the channel a pre-formatted plain-text summary plus an
//! optional structured block list. Delivery failure is reported as a typed
//! error so the caller can log it; it never aborts a run whose checks are
//! already persisted.

use crate::error::MonitorError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// An external channel accepting human-readable summaries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str, blocks: Option<Vec<Value>>) -> Result<(), MonitorError>;
}

/// Slack-compatible incoming webhook.
pub struct SlackWebhook {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn send(&self, text: &str, blocks: Option<Vec<Value>>) -> Result<(), MonitorError> {
        let mut payload = serde_json::json!({ "text": text });
        if let Some(blocks) = blocks {
            payload["blocks"] = Value::Array(blocks);
        }

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::Notification(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MonitorError::Notification(format!(
                "webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// One Slack `section` block with mrkdwn text.
pub fn section(text: impl Into<String>) -> Value {
    serde_json::json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text.into() }
    })
}

/// A Slack `divider` block.
pub fn divider() -> Value {
    serde_json::json!({ "type": "divider" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_text_and_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(
                serde_json::json!({ "text": "2 dates unlocked" }),
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SlackWebhook::new(format!("{}/hook", server.uri()));
        notifier
            .send("2 dates unlocked", Some(vec![section("*hello*"), divider()]))
            .await
            .expect("delivery should succeed");
    }

    #[tokio::test]
    async fn test_server_error_is_notification_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = SlackWebhook::new(server.uri());
        let err = notifier.send("ping", None).await.expect_err("must fail");
        assert!(matches!(err, MonitorError::Notification(_)));
        assert!(!err.is_fatal());
    }
}
