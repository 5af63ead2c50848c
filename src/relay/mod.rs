//! Question forwarding.
//!
//! - [`prompt`]: ChatML prompt construction
//! - [`client`]: KServe v2 inference client
//! - [`answer`]: reasoning-segment stripping
//! - [`selection`]: current model selection

pub mod answer;
pub mod client;
pub mod prompt;
pub mod selection;

use std::sync::Arc;

use tracing::{info, warn};

use crate::alert::{self, Alert, Notifier};
use crate::metrics::Metrics;
use client::{ForwardError, InferClient};
use selection::ModelSelection;

/// A post-processed answer and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub model: String,
}

/// Forwards questions to the selected model and reports failures.
pub struct Relay {
    client: InferClient,
    selection: ModelSelection,
    notifier: Arc<dyn Notifier>,
    metrics: Metrics,
}

impl Relay {
    pub fn new(
        client: InferClient,
        selection: ModelSelection,
        notifier: Arc<dyn Notifier>,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            selection,
            notifier,
            metrics,
        }
    }

    pub fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    /// Ask the current model one question.
    ///
    /// Makes exactly one downstream call. On failure an alert is dispatched
    /// in the background before the error is returned.
    pub async fn ask(
        &self,
        request_id: &str,
        question: &str,
        context: &str,
    ) -> Result<Answer, ForwardError> {
        self.metrics.ask_requests.inc();

        let model = self.selection.current().await;
        let prompt = prompt::build_prompt(context, question);

        let timer = self.metrics.upstream_latency.start_timer();
        let result = self.client.infer(&model, &prompt).await;
        timer.observe_duration();

        match result {
            Ok(raw) => {
                let text = answer::strip_think(&raw);
                info!(
                    request_id,
                    model,
                    raw_len = raw.len(),
                    answer_len = text.len(),
                    "Answer relayed"
                );
                Ok(Answer { text, model })
            }
            Err(e) => {
                let status_code = e.status_code();
                warn!(request_id, model, status_code, kind = e.kind(), "Forwarding failed: {e}");
                self.metrics.ask_failures.with_label_values(&[e.kind()]).inc();
                alert::dispatch(
                    self.notifier.clone(),
                    Alert {
                        request_id: request_id.to_string(),
                        model,
                        status_code,
                        message: e.to_string(),
                        question: question.to_string(),
                    },
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("client", &self.client)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
