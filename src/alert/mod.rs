//! Failure alerting.
//!
//! Forwarding failures are reported through an injected [`Notifier`]. Alerts
//! are fire-and-forget: [`dispatch`] hands them to a background task and a
//! failed delivery is only logged, never surfaced to the client.
//!
//! - [`webhook`]: chat webhook notifier

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub use webhook::WebhookNotifier;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected alert with status {0}")]
    Rejected(u16),
}

/// One failed forwarding attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub request_id: String,
    pub model: String,
    pub status_code: u16,
    pub message: String,
    pub question: String,
}

impl Alert {
    /// Human-readable chat message.
    pub fn render(&self) -> String {
        format!(
            "[infer-relay] /ask failed ({status})\nmodel: {model}\nrequest: {id}\nerror: {message}\nquestion: {question}",
            status = self.status_code,
            model = self.model,
            id = self.request_id,
            message = self.message,
            question = self.question,
        )
    }
}

/// Sink for failure alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Notifier used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        debug!(request_id = alert.request_id, "Alert dropped (no webhook configured)");
        Ok(())
    }
}

/// Deliver an alert on a background task.
pub fn dispatch(notifier: Arc<dyn Notifier>, alert: Alert) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&alert).await {
            warn!(request_id = alert.request_id, "Failed to deliver alert: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    struct FailingNotifier(mpsc::UnboundedSender<()>);

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _alert: &Alert) -> Result<(), AlertError> {
            let _ = self.0.send(());
            Err(AlertError::Rejected(500))
        }
    }

    fn sample() -> Alert {
        Alert {
            request_id: "req-1".to_string(),
            model: "Qwen".to_string(),
            status_code: 503,
            message: "down".to_string(),
            question: "2+2?".to_string(),
        }
    }

    #[test]
    fn test_render_includes_fields() {
        let text = sample().render();
        assert!(text.contains("503"));
        assert!(text.contains("down"));
        assert!(text.contains("2+2?"));
        assert!(text.contains("Qwen"));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(Arc::new(FailingNotifier(tx)), sample());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_noop_notifier() {
        assert!(NoopNotifier.notify(&sample()).await.is_ok());
    }
}
