//! Chat webhook notifier.
//!
//! Posts `{"text": ...}`, the payload accepted by Slack, Google Chat and
//! Mattermost incoming webhooks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{Alert, AlertError, Notifier};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    text: &'a str,
}

#[derive(Clone)]
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Host part of the webhook URL. Incoming-webhook paths embed the
    /// secret token, so only this is safe to log.
    pub fn host(&self) -> &str {
        host_of(&self.url)
    }
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("host", &self.host())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        let text = alert.render();
        let response = self
            .http
            .post(&self.url)
            .json(&ChatMessage { text: &text })
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected(status.as_u16()));
        }

        debug!(request_id = alert.request_id, "Alert delivered");
        Ok(())
    }
}
