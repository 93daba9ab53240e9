//! Slack delivery via `chat.postMessage`.
//!
//! Every alert is posted to all configured channels concurrently on a
//! spawned task; `notify` only fails when no runtime is available.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures_util::future::join_all;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::schema::SlackConfig;
use crate::notify::{format_message, Notifier, NotifyError};

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    blocks: &'a Value,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Build Block Kit blocks for an alert.
pub fn message_blocks(text: &str) -> Value {
    json!([
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": text,
            }
        }
    ])
}

/// Posts alerts to Slack channels.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    auth: HeaderValue,
    post_url: String,
    channel_ids: Arc<[String]>,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| NotifyError::Unavailable(format!("invalid Slack token: {}", e)))?;

        Ok(Self {
            client,
            auth,
            post_url: format!("{}/chat.postMessage", config.api_url.trim_end_matches('/')),
            channel_ids: config.channel_ids.clone().into(),
        })
    }

    /// Post one message to one channel.
    pub async fn post(&self, channel: &str, blocks: &Value) -> Result<(), NotifyError> {
        let response: SlackResponse = self
            .client
            .post(&self.post_url)
            .header(AUTHORIZATION, self.auth.clone())
            .json(&PostMessage { channel, blocks })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected(
                response.error.unwrap_or_else(|| "unknown Slack error".to_string()),
            ))
        }
    }

    /// Post to every configured channel, logging failures.
    pub async fn broadcast(&self, blocks: Value) -> usize {
        let posts = self.channel_ids.iter().map(|channel| {
            let blocks = &blocks;
            async move { (channel, self.post(channel, blocks).await) }
        });

        let mut delivered = 0;
        for (channel, outcome) in join_all(posts).await {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "Slack message delivery failed");
                    crate::observability::metrics::record_notification_failure();
                }
            }
        }
        delivered
    }
}

impl Notifier for SlackNotifier {
    fn notify(&self, target_name: &str, message: &str, is_error: bool) -> Result<(), NotifyError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?;

        let blocks = message_blocks(&format_message(target_name, message, is_error, Local::now()));
        let notifier = self.clone();
        let target_name = target_name.to_string();

        handle.spawn(async move {
            let delivered = notifier.broadcast(blocks).await;
            tracing::debug!(
                target_name = %target_name,
                delivered,
                channels = notifier.channel_ids.len(),
                "Slack alert dispatched"
            );
        });
        Ok(())
    }
}
